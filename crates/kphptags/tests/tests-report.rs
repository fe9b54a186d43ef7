#![allow(clippy::unwrap_used)]
use std::fs;

use kphptags::cli::{RunResult, run};
use kphptags_core::{
    config::{BaseConfig, Config, OutputConfig},
    diagnostic::Severity,
    lint::ValidationOptions,
};
use similar_asserts::assert_eq;
use temp_dir::TempDir;

mod common;
use common::*;

#[test]
fn test_compact_report() {
    insta::assert_snapshot!(snapshot_content(
        "Sample.php",
        &ValidationOptions::builder()
            .min_severity(Severity::Error)
            .build(),
        true,
    ), @r"
Sample.php:17:1
function empty_tag
  15:4 error [missing-arguments] provide arguments: 'all' or detailed inspections

Sample.php:22:1
function messy
  20:44 error [negated-wildcard] 'all' can't be negated
  20:44 error [misplaced-wildcard] use 'all' at the beginning

Sample.php:25:1
class Service
  24:5 error [inapplicable-tag] @kphp-warn-performance is not applicable here
");
}

#[test]
fn test_pretty_report() {
    let output = snapshot_content("Sample.php", &ValidationOptions::default(), false);
    assert!(output.contains("function messy"));
    assert!(output.contains("Sample.php"));
    assert!(output.contains("error: 'all' can't be negated"));
    assert!(output.contains(
        "warning: unknown item `bogus` (fix: remove unknown bogus)"
    ));
    assert!(output.contains("method run"));
    assert!(!output.contains("function good"));
}

fn write_sources(d: &TempDir) {
    let src = d.child("src");
    fs::create_dir(&src).unwrap();
    fs::copy(format!("{TEST_DATA}/Sample.php"), src.join("Sample.php")).unwrap();
    fs::write(
        src.join("Clean.php"),
        "<?php\n/** @kphp-warn-performance all */\nfunction clean() {}\n",
    )
    .unwrap();
    fs::write(src.join("notes.txt"), "@kphp-warn-performance").unwrap();
}

#[test]
fn test_run_compact() {
    let d = TempDir::new().unwrap();
    write_sources(&d);
    let out = d.child("out.txt");
    let config = Config::builder()
        .kphptags(BaseConfig::builder().paths(vec![d.child("src")]).build())
        .output(OutputConfig::builder().compact(true).out(out.clone()).build())
        .build();
    let res = run(&config).unwrap();
    assert!(matches!(res, RunResult::SomeDiagnostics));
    let output = fs::read_to_string(out).unwrap();
    assert!(output.contains("function messy\n"));
    assert!(output.contains("  20:44 error [negated-wildcard] 'all' can't be negated\n"));
    assert!(!output.contains("clean"));
}

#[test]
fn test_run_json() {
    let d = TempDir::new().unwrap();
    write_sources(&d);
    let out = d.child("out.json");
    let config = Config::builder()
        .kphptags(
            BaseConfig::builder()
                .paths(vec![d.child("src")])
                .min_severity(Severity::Error)
                .applicability(false)
                .build(),
        )
        .output(OutputConfig::builder().json(true).out(out.clone()).build())
        .build();
    let res = run(&config).unwrap();
    assert!(matches!(res, RunResult::SomeDiagnostics));
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(out).unwrap()).unwrap();
    let files = json.as_array().unwrap();
    assert_eq!(files.len(), 1);
    let items = files[0]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["name"], "empty_tag");
    assert_eq!(items[1]["diags"][1]["kind"], "misplaced-wildcard");
}

#[test]
fn test_run_no_issue() {
    let d = TempDir::new().unwrap();
    write_sources(&d);
    let out = d.child("out.txt");
    let config = Config::builder()
        .kphptags(
            BaseConfig::builder()
                .paths(vec![d.child("src/Clean.php")])
                .build(),
        )
        .output(OutputConfig::builder().out(out.clone()).build())
        .build();
    let res = run(&config).unwrap();
    assert!(matches!(res, RunResult::NoDiagnostics));
    assert_eq!(fs::read_to_string(out).unwrap(), "No issue found\n");
}

#[test]
fn test_run_no_files() {
    let d = TempDir::new().unwrap();
    let config = Config::builder()
        .kphptags(BaseConfig::builder().paths(vec![d.path().to_path_buf()]).build())
        .build();
    let err = run(&config).err().unwrap();
    assert_eq!(err.to_string(), "no PHP file found, nothing to analyze");
}
