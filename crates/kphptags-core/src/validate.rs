//! Validation of the argument list of item-based tags
//!
//! The [`validate`] function walks the argument items once, left to right, and reports every problem as a
//! [`Diagnostic`]. It never fails: a tag without any argument is a diagnostic too.
use tracing::trace;

use crate::{
    diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink},
    doccomment::DocTag,
    items::ArgumentList,
    tags::{TagKind, WILDCARD},
    textindex::TextRange,
};

/// Validate the argument items of a tag of the given kind
///
/// `tag_span` is used for problems which concern the tag as a whole (no argument at all). Diagnostics are returned in
/// item order, and for a given item, in the order the checks are performed:
///
/// 1. wildcard: negated, then not at the beginning;
/// 2. unknown item;
/// 3. known item: no effect after the wildcard, negation without the wildcard, duplicate.
///
/// An item can trigger several diagnostics.
#[must_use]
pub fn validate(kind: TagKind, items: &ArgumentList, tag_span: &TextRange) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    let Some(head) = items.head() else {
        out.push(Diagnostic::new(
            DiagnosticKind::MissingArguments,
            format!("provide arguments: '{WILDCARD}' or detailed inspections"),
            tag_span.clone(),
        ));
        return out;
    };
    let available = kind.available_items();
    // a linear search is fine, the list is bounded by the number of available items
    let mut seen: Vec<&str> = Vec::with_capacity(available.len());
    let mut wildcard_seen = false;

    let mut cursor = Some(head);
    while let Some(item) = cursor {
        let item = item.item();
        let name = item.name.as_str();
        let span = &item.span;
        trace!(name, negated = item.negated, "checking argument item");
        if kind.is_wildcard(name) {
            wildcard_seen = true;
            if item.negated {
                out.push(Diagnostic::new(
                    DiagnosticKind::NegatedWildcard,
                    format!("'{WILDCARD}' can't be negated"),
                    span.clone(),
                ));
            }
            if !seen.is_empty() {
                out.push(Diagnostic::new(
                    DiagnosticKind::MisplacedWildcard,
                    format!("use '{WILDCARD}' at the beginning"),
                    span.clone(),
                ));
            }
        } else if !available.contains(&name) {
            out.push(
                Diagnostic::new(
                    DiagnosticKind::UnknownItem,
                    format!("unknown item `{name}`"),
                    span.clone(),
                )
                .with_removal(format!("remove unknown {name}")),
            );
        } else {
            if wildcard_seen && !item.negated {
                out.push(
                    Diagnostic::new(
                        DiagnosticKind::RedundantItem,
                        format!("'{WILDCARD}' exists, this item has no effect"),
                        span.clone(),
                    )
                    .with_removal(format!("remove excessive {name}")),
                );
            }
            if !wildcard_seen && item.negated {
                out.push(Diagnostic::new(
                    DiagnosticKind::NegationWithoutWildcard,
                    format!("using negation without '{WILDCARD}' is confusing"),
                    span.clone(),
                ));
            }
            if seen.contains(&name) {
                out.push(
                    Diagnostic::new(DiagnosticKind::DuplicateItem, "duplicate item", span.clone())
                        .with_removal(format!("remove duplicated {name}")),
                );
            }
            seen.push(name);
        }
        cursor = cursor.and_then(|c| c.next());
    }
    out
}

/// Validate a tag instance and write the resulting diagnostics to the sink
pub fn annotate(kind: TagKind, tag: &DocTag, sink: &mut impl DiagnosticSink) {
    for diag in validate(kind, &tag.arguments, &tag.span) {
        sink.emit(diag);
    }
}
