#![expect(clippy::unwrap_used)]
use std::path::Path;

use kphptags_core::{
    lint::{ValidationOptions, lint},
    parser::{Parse as _, php::PhpParser},
};

/// Lint a file and render its diagnostics in the compact text format
#[must_use]
pub fn snapshot_content(path: &str, options: &ValidationOptions) -> String {
    let parser = PhpParser::new();
    let diags = lint(parser.clone(), path, options, true).unwrap();
    let sources = parser.get_sources().unwrap();
    let Some(diags) = diags else {
        return String::new();
    };
    assert!(sources.contains_key(&diags.document_id));
    let source_name = Path::new(path).file_name().unwrap().to_string_lossy();
    let mut buf = Vec::new();
    for item in &diags.items {
        item.print_compact(&mut buf, &source_name).unwrap();
    }
    String::from_utf8(buf).unwrap()
}
