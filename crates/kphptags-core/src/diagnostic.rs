//! Diagnostics emitted by the tag validators
//!
//! Validators produce plain [`Diagnostic`] values. Hosts which want to receive them one at a time (an editor
//! annotation API, a counter, a channel) implement [`DiagnosticSink`].
use derive_more::{Display, FromStr};
use serde::{Deserialize, Serialize};

use crate::textindex::TextRange;

/// The severity of a diagnostic, ordered from least to most severe
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    FromStr,
)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
#[display(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
}

/// The kind of problem a diagnostic reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "kebab-case")]
#[display(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// The tag has no argument at all
    MissingArguments,
    /// The wildcard is prefixed with the negation marker
    NegatedWildcard,
    /// The wildcard comes after a concrete item
    MisplacedWildcard,
    /// The item name is not part of the tag's grammar
    UnknownItem,
    /// A positive item after the wildcard, which already covers it
    RedundantItem,
    /// A negated item without a preceding wildcard
    NegationWithoutWildcard,
    /// The item was already listed
    DuplicateItem,
    /// The tag decorates a declaration it does not apply to
    InapplicableTag,
    /// The doc comment could not be parsed
    ParsingError,
}

impl DiagnosticKind {
    /// The severity associated with this kind of problem
    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            Self::MissingArguments
            | Self::NegatedWildcard
            | Self::MisplacedWildcard
            | Self::InapplicableTag
            | Self::ParsingError => Severity::Error,
            Self::UnknownItem
            | Self::RedundantItem
            | Self::NegationWithoutWildcard
            | Self::DuplicateItem => Severity::Warning,
        }
    }
}

/// A suggested correction: delete the text in `remove`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fix {
    /// Human-readable label of the fix
    pub message: String,

    /// The span to delete
    pub remove: TextRange,
}

/// A single finding related to a doc tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct Diagnostic {
    pub kind: DiagnosticKind,

    pub severity: Severity,

    pub message: String,

    /// The span of the offending item, or of the tag when the problem concerns the tag as a whole
    pub span: TextRange,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<Fix>,
}

impl Diagnostic {
    /// Create a diagnostic with the kind's default severity and no fix
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, span: TextRange) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            message: message.into(),
            span,
            fix: None,
        }
    }

    /// Attach a fix which deletes this diagnostic's span
    #[must_use]
    pub fn with_removal(mut self, message: impl Into<String>) -> Self {
        self.fix = Some(Fix {
            message: message.into(),
            remove: self.span.clone(),
        });
        self
    }
}

/// A receiver for diagnostics
pub trait DiagnosticSink {
    fn emit(&mut self, diag: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diag: Diagnostic) {
        self.push(diag);
    }
}

/// A sink which only counts diagnostics, by severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounter {
    pub info: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl SeverityCounter {
    #[must_use]
    pub fn total(&self) -> usize {
        self.info + self.warnings + self.errors
    }
}

impl DiagnosticSink for SeverityCounter {
    fn emit(&mut self, diag: Diagnostic) {
        match diag.severity {
            Severity::Info => self.info += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Error => self.errors += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!(Severity::from_str("warning").unwrap(), Severity::Warning);
        assert_eq!(Severity::from_str("Error").unwrap(), Severity::Error);
        assert_eq!(Severity::Info.to_string(), "info");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(
            DiagnosticKind::NegationWithoutWildcard.to_string(),
            "negation-without-wildcard"
        );
        assert_eq!(DiagnosticKind::UnknownItem.to_string(), "unknown-item");
    }

    #[test]
    fn test_default_severity() {
        let diag = Diagnostic::new(
            DiagnosticKind::DuplicateItem,
            "duplicate item",
            TextRange::default(),
        );
        assert_eq!(diag.severity, Severity::Warning);
        assert!(diag.fix.is_none());
        let diag = diag.with_removal("remove duplicated array-reserve");
        assert_eq!(
            diag.fix.map(|f| f.message),
            Some("remove duplicated array-reserve".to_string())
        );
    }

    #[test]
    fn test_counter_sink() {
        let mut counter = SeverityCounter::default();
        for kind in [
            DiagnosticKind::MissingArguments,
            DiagnosticKind::UnknownItem,
            DiagnosticKind::DuplicateItem,
        ] {
            counter.emit(Diagnostic::new(
                kind,
                kind.to_string(),
                TextRange::default(),
            ));
        }
        assert_eq!(counter.errors, 1);
        assert_eq!(counter.warnings, 2);
        assert_eq!(counter.total(), 3);
    }
}
