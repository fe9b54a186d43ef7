//! Check the performance doc tags of a PHP source file
//!
//! The [`lint`] function parses the source file, finds the doc comments and the declarations they decorate, validates
//! every known tag and emits a list of diagnostics, grouped by source item.
use std::{
    fmt,
    fs::File,
    io,
    path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::{debug, trace};

use crate::{
    config::Config,
    declaration::{Declaration, DeclarationKind},
    diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink as _, Severity, SeverityCounter},
    doccomment::DocComment,
    error::{Error, Result},
    parser::{DocumentId, DocumentedItem, Parse, ParsedDocument},
    tags::TagRegistry,
    textindex::TextRange,
};

/// Diagnostics for a single PHP file
#[derive(Debug, Clone, Serialize)]
pub struct FileDiagnostics {
    /// Path to the file
    pub path: PathBuf,

    /// A unique ID for the document given by the parser
    ///
    /// Can be used to retrieve the document contents after parsing (via [`Parse::get_sources`]).
    #[serde(skip_serializing)]
    pub document_id: DocumentId,

    /// Diagnostics, grouped by source item (function, class, etc.)
    pub items: Vec<ItemDiagnostics>,
}

impl FileDiagnostics {
    /// Count the diagnostics of this file by severity
    #[must_use]
    pub fn count(&self) -> SeverityCounter {
        let mut counter = SeverityCounter::default();
        for diag in self.items.iter().flat_map(|i| &i.diags) {
            counter.emit(diag.clone());
        }
        counter
    }
}

/// The type of source item a group of diagnostics relates to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display, derive_more::From)]
pub enum ItemType {
    /// A declaration decorated by a doc comment
    #[display("{_0}")]
    Declaration(DeclarationKind),

    /// A doc comment which could not be parsed
    #[display("parsing-error")]
    #[from(ignore)]
    ParsingError,
}

impl Serialize for ItemType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Diagnostics for a single source item (function, class, etc.)
#[derive(Debug, Clone, Serialize, bon::Builder)]
#[non_exhaustive]
#[builder(on(String, into))]
pub struct ItemDiagnostics {
    /// The type of this source item (function, class, etc.)
    pub item_type: ItemType,

    /// The name of the item, empty for anonymous items
    pub name: String,

    /// The span of the item's declaration (keyword and name), or of the comment for parsing errors
    pub span: TextRange,

    /// The diagnostics related to this item, in source order
    pub diags: Vec<Diagnostic>,
}

impl ItemDiagnostics {
    /// Print the diagnostics for a single source item in a compact format
    ///
    /// The writer `f` can be stderr or a file handle, for example. The `source_name` should be
    /// the display name for the file (typically a relative path from the working directory).
    pub fn print_compact(
        &self,
        f: &mut impl io::Write,
        source_name: &str,
    ) -> std::result::Result<(), io::Error> {
        writeln!(f, "{source_name}:{}", self.span.start)?;
        writeln!(f, "{}", self.title())?;
        for diag in &self.diags {
            write!(
                f,
                "  {} {} [{}] {}",
                diag.span.start, diag.severity, diag.kind, diag.message
            )?;
            if let Some(fix) = &diag.fix {
                write!(f, " (fix: {})", fix.message)?;
            }
            writeln!(f)?;
        }
        writeln!(f)
    }

    /// A short description of the item, e.g. `function foo`
    #[must_use]
    pub fn title(&self) -> String {
        if self.name.is_empty() {
            self.item_type.to_string()
        } else {
            format!("{} {}", self.item_type, self.name)
        }
    }
}

impl fmt::Display for ItemDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title())
    }
}

/// Lint a file by identifying problems in its performance doc tags.
///
/// This is the main business logic entrypoint related to using this library. The path to the PHP file should be
/// provided. [`ValidationOptions`] can be provided to control which diagnostics get reported.
/// The `keep_contents` parameter controls if the parser keeps the original source code, to be retrieved with
/// [`Parse::get_sources`].
pub fn lint(
    mut parser: impl Parse,
    path: impl AsRef<Path>,
    options: &ValidationOptions,
    keep_contents: bool,
) -> Result<Option<FileDiagnostics>> {
    fn inner(
        path: &Path,
        document: ParsedDocument,
        options: &ValidationOptions,
    ) -> Option<FileDiagnostics> {
        let mut items: Vec<_> = document
            .documents
            .into_iter()
            .filter_map(|item| validate_item(item, options))
            .collect();
        debug!(path = ?path, items = items.len(), "linted file");
        if items.is_empty() {
            return None;
        }
        items.sort_by_key(|i| i.span.start);
        Some(FileDiagnostics {
            path: path.to_path_buf(),
            document_id: document.id,
            items,
        })
    }
    let file = File::open(&path).map_err(|err| Error::IOError {
        path: path.as_ref().to_path_buf(),
        err,
    })?;
    let document = parser.parse_document(file, Some(&path), keep_contents)?;
    Ok(inner(path.as_ref(), document, options))
}

/// Validate the tags of a single documented item, returning `None` if there is nothing to report
pub fn validate_item(item: DocumentedItem, options: &ValidationOptions) -> Option<ItemDiagnostics> {
    match item {
        DocumentedItem::Commented { owner, comment } => {
            let diags = validate_comment(&comment, &owner, options);
            if diags.is_empty() {
                return None;
            }
            let span = if owner.span.is_empty() {
                comment.span
            } else {
                owner.span
            };
            Some(ItemDiagnostics {
                item_type: owner.kind.into(),
                name: owner.name,
                span,
                diags,
            })
        }
        DocumentedItem::ParsingError(err) => {
            let span = match &err {
                Error::DocCommentParsingError { span, .. } => span.clone(),
                _ => TextRange::default(),
            };
            let diag = Diagnostic::new(DiagnosticKind::ParsingError, err.to_string(), span.clone());
            (diag.severity >= options.min_severity).then(|| ItemDiagnostics {
                item_type: ItemType::ParsingError,
                name: String::new(),
                span,
                diags: vec![diag],
            })
        }
    }
}

/// Validate every known tag of a doc comment, in order
///
/// Tags which are not in the registry are ignored. A tag that doesn't apply to its owner is reported (if
/// [`ValidationOptions::applicability`] is enabled) and not validated further.
#[must_use]
pub fn validate_comment(
    comment: &DocComment,
    owner: &Declaration,
    options: &ValidationOptions,
) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    for tag in &comment.tags {
        let Some(kind) = options.registry.lookup(&tag.name) else {
            continue;
        };
        trace!(tag = %kind, owner = %owner.kind, "validating tag");
        if options.applicability && !options.registry.is_applicable_for(kind, owner) {
            diags.push(Diagnostic::new(
                DiagnosticKind::InapplicableTag,
                format!("{kind} is not applicable here"),
                tag.span.clone(),
            ));
            continue;
        }
        kind.annotate(tag, &mut diags);
    }
    diags.retain(|d| d.severity >= options.min_severity);
    diags
}

/// Validation options to control which diagnostics get reported
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder)]
#[non_exhaustive]
pub struct ValidationOptions {
    /// Whether tags on declarations they don't apply to should be reported
    ///
    /// When disabled, such tags are validated like any other.
    #[builder(default = true)]
    pub applicability: bool,

    /// Diagnostics with a lower severity are dropped
    #[builder(default)]
    pub min_severity: Severity,

    /// The known tags
    #[builder(default = TagRegistry::builtin())]
    pub registry: TagRegistry,
}

impl Default for ValidationOptions {
    /// Get default validation options
    ///
    /// It's important that these defaults match the default values in the builder and in the [`Config`] struct
    /// (there is a test for this).
    fn default() -> Self {
        Self {
            applicability: true,
            min_severity: Severity::default(),
            registry: TagRegistry::builtin(),
        }
    }
}

/// Create a [`ValidationOptions`] from a [`Config`] reference
impl From<&Config> for ValidationOptions {
    fn from(value: &Config) -> Self {
        Self {
            applicability: value.kphptags.applicability,
            min_severity: value.kphptags.min_severity,
            registry: TagRegistry::builtin(),
        }
    }
}

/// Create a [`ValidationOptions`] from a [`Config`]
impl From<Config> for ValidationOptions {
    fn from(value: Config) -> Self {
        (&value).into()
    }
}
