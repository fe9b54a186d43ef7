//! Declarations which can carry a doc comment
use derive_more::Display;
use serde::Serialize;

use crate::textindex::TextRange;

/// The kind of declaration decorated by a doc comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    #[display("function")]
    Function,
    #[display("method")]
    Method,
    #[display("class")]
    Class,
    #[display("interface")]
    Interface,
    #[display("trait")]
    Trait,
    #[display("enum")]
    Enum,
    #[display("property")]
    Property,
    #[display("constant")]
    Constant,
    /// Anything else (statements, variable docs, file-level comments)
    #[display("item")]
    Other,
}

impl DeclarationKind {
    /// Whether this declaration is a function-like unit (free function, closure or method)
    #[must_use]
    pub fn is_function_like(self) -> bool {
        matches!(self, Self::Function | Self::Method)
    }
}

/// The declaration which follows a doc comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, bon::Builder)]
#[non_exhaustive]
#[builder(on(String, into))]
pub struct Declaration {
    pub kind: DeclarationKind,

    /// The declared name, empty for anonymous items
    #[builder(default)]
    pub name: String,

    /// The span of the declaration's keyword and name
    #[builder(default)]
    pub span: TextRange,
}

impl Declaration {
    pub fn new(kind: DeclarationKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            span: TextRange::default(),
        }
    }

    #[must_use]
    pub fn is_function_like(&self) -> bool {
        self.kind.is_function_like()
    }
}
