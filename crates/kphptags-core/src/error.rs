//! The error and result types for kphptags
use std::path::PathBuf;

use crate::textindex::TextRange;

/// The result of a kphptags operation
pub type Result<T> = std::result::Result<T, Error>;

/// A kphptags error
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error during parsing of a doc comment
    #[error("error parsing a doc comment: {message}")]
    DocCommentParsingError { span: TextRange, message: String },

    /// [`Parse::get_sources`][crate::parser::Parse::get_sources] was called while other references (clones) still
    /// existed
    #[error("`Parse::get_sources` can only be called on the last parser instance")]
    DanglingParserReferences,

    /// IO error
    #[error("IO error for {path:?}: {err}")]
    IOError { path: PathBuf, err: std::io::Error },
}
