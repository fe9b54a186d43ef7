#![allow(clippy::unwrap_used)]
use kphptags::cli::print_reports;
use kphptags_core::{
    lint::{FileDiagnostics, ValidationOptions, lint},
    parser::{Parse as _, php::PhpParser},
};

pub const TEST_DATA: &str = "../kphptags-core/test-data";

/// Lint a test file and render the report like the CLI does
#[must_use]
pub fn snapshot_content(file_name: &str, options: &ValidationOptions, compact: bool) -> String {
    let parser = PhpParser::new();
    let diags = lint(
        parser.clone(),
        format!("{TEST_DATA}/{file_name}"),
        options,
        !compact,
    )
    .unwrap();
    let mut sources = parser.get_sources().unwrap();
    let contents = diags
        .as_ref()
        .and_then(|f| sources.remove(&f.document_id));
    generate_output(diags, contents, compact)
}

fn generate_output(diags: Option<FileDiagnostics>, contents: Option<String>, compact: bool) -> String {
    let Some(diags) = diags else {
        return String::new();
    };
    let _ = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(false)
                .unicode(false)
                .color(false)
                .build(),
        )
    }));
    let mut buf = Vec::new();
    print_reports(
        &mut buf,
        TEST_DATA,
        diags,
        contents.unwrap_or_default(),
        compact,
    )
    .unwrap();
    String::from_utf8(buf).unwrap()
}
