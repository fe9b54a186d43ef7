//! The catalogue of known doc tags
//!
//! Every supported tag is a variant of [`TagKind`]. A [`TagRegistry`] is built once at startup (usually with
//! [`TagRegistry::builtin`]) and handed by reference to whatever needs to resolve tag names.
use derive_more::Display;
use serde::Serialize;

use crate::{
    declaration::Declaration,
    diagnostic::DiagnosticSink,
    doccomment::{DocComment, DocTag},
    validate,
};

/// The special item name meaning "every recognized item"
pub const WILDCARD: &str = "all";

/// The items recognized by the performance tags, in the order they are suggested
///
/// The [`WILDCARD`] is accepted too, but it's treated as a special value and not listed here.
pub const PERFORMANCE_ITEMS: &[&str] = &[
    "implicit-array-cast",
    "constant-execution-in-loop",
    "array-merge-into",
    "array-reserve",
];

/// A known tag kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
pub enum TagKind {
    /// Gives a compilation error if potential optimizations are available
    #[display("@kphp-warn-performance")]
    #[serde(rename = "@kphp-warn-performance")]
    WarnPerformance,

    /// Generates a report of potential optimizations
    #[display("@kphp-analyze-performance")]
    #[serde(rename = "@kphp-analyze-performance")]
    AnalyzePerformance,
}

impl TagKind {
    /// All the tag kinds, in registration order
    pub const ALL: &[TagKind] = &[TagKind::WarnPerformance, TagKind::AnalyzePerformance];

    /// The canonical tag name, including the leading `@`
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            TagKind::WarnPerformance => "@kphp-warn-performance",
            TagKind::AnalyzePerformance => "@kphp-analyze-performance",
        }
    }

    /// Resolve a tag name (including the leading `@`)
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }

    /// Human-readable help text
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            TagKind::WarnPerformance => {
                "[KPHP] Same as @kphp-analyze-performance, but it doesn't generate a report: instead, it gives a \
                 compilation error if potential optimizations are available."
            }
            TagKind::AnalyzePerformance => {
                "[KPHP] Analyze the function body and generate a report with potential performance optimizations."
            }
        }
    }

    /// The recognized item names, without the [`WILDCARD`]
    #[must_use]
    pub fn available_items(self) -> &'static [&'static str] {
        match self {
            TagKind::WarnPerformance | TagKind::AnalyzePerformance => PERFORMANCE_ITEMS,
        }
    }

    /// Whether `name` is the wildcard of this tag's grammar
    #[must_use]
    pub fn is_wildcard(self, name: &str) -> bool {
        match self {
            TagKind::WarnPerformance | TagKind::AnalyzePerformance => name == WILDCARD,
        }
    }

    /// Whether the tag may decorate the given declaration
    #[must_use]
    pub fn is_applicable_for(self, owner: &Declaration) -> bool {
        match self {
            TagKind::WarnPerformance | TagKind::AnalyzePerformance => owner.is_function_like(),
        }
    }

    /// The other tag which governs the same concern, if any
    #[must_use]
    pub fn sibling(self) -> Option<TagKind> {
        match self {
            TagKind::WarnPerformance => Some(TagKind::AnalyzePerformance),
            TagKind::AnalyzePerformance => Some(TagKind::WarnPerformance),
        }
    }

    /// Whether this tag is present in the comment
    #[must_use]
    pub fn exists_in(self, comment: &DocComment) -> bool {
        comment.contains_tag(self.name())
    }

    /// Validate the arguments of a tag instance and write the diagnostics to the sink
    pub fn annotate(self, tag: &DocTag, sink: &mut impl DiagnosticSink) {
        match self {
            TagKind::WarnPerformance | TagKind::AnalyzePerformance => {
                validate::annotate(self, tag, sink);
            }
        }
    }

    /// Whether the editor should offer completion after the tag name was typed
    ///
    /// Completion is only offered on functions, and only if the sibling tag is not already in the comment.
    #[must_use]
    pub fn needs_auto_complete_on_typing(
        self,
        comment: &DocComment,
        owner: Option<&Declaration>,
    ) -> bool {
        let Some(owner) = owner else {
            return false;
        };
        owner.is_function_like() && !self.sibling().is_some_and(|s| s.exists_in(comment))
    }

    /// The text to insert after the tag name when completion is accepted
    #[must_use]
    pub fn on_auto_completed(self, _comment: &DocComment) -> Option<&'static str> {
        match self {
            TagKind::WarnPerformance | TagKind::AnalyzePerformance => Some(WILDCARD),
        }
    }
}

/// The table of tag kinds known to an analysis run
///
/// The registry is filled before any analysis starts and is read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagRegistry {
    kinds: Vec<TagKind>,
}

impl TagRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in tag kind
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for kind in TagKind::ALL {
            registry.register(*kind);
        }
        registry
    }

    /// Add a tag kind, keyed by its name
    ///
    /// Returns `false` (and keeps the existing entry) if a kind with the same name was already registered.
    pub fn register(&mut self, kind: TagKind) -> bool {
        if self.lookup(kind.name()).is_some() {
            return false;
        }
        self.kinds.push(kind);
        true
    }

    /// Resolve a tag name (including the leading `@`) to its kind
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<TagKind> {
        self.kinds.iter().copied().find(|k| k.name() == name)
    }

    /// Whether the tag kind may decorate the given declaration
    #[must_use]
    pub fn is_applicable_for(&self, kind: TagKind, owner: &Declaration) -> bool {
        kind.is_applicable_for(owner)
    }

    /// The registered kinds, in registration order
    pub fn kinds(&self) -> impl Iterator<Item = TagKind> + '_ {
        self.kinds.iter().copied()
    }
}
