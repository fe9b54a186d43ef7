//! PHP source parser interface
use std::{collections::HashMap, io, path::Path};

use crate::{
    declaration::Declaration,
    doccomment::DocComment,
    error::{Error, Result},
    textindex::{TextIndex, TextRange, compute_indices},
};

pub mod php;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DocumentId(u64);

impl DocumentId {
    /// Generate a new random and unique document ID
    #[must_use]
    pub fn new() -> Self {
        DocumentId(fastrand::u64(..))
    }
}

/// A doc comment found in a document
#[derive(Debug)]
pub enum DocumentedItem {
    /// A doc comment and the declaration that follows it
    Commented {
        owner: Declaration,
        comment: DocComment,
    },

    /// A doc comment which could not be parsed
    ///
    /// The error is a [`Error::DocCommentParsingError`].
    ParsingError(Error),
}

impl DocumentedItem {
    fn spans_mut(&mut self) -> Box<dyn Iterator<Item = &mut TextRange> + '_> {
        match self {
            DocumentedItem::Commented { owner, comment } => {
                Box::new(std::iter::once(&mut owner.span).chain(comment.spans_mut()))
            }
            DocumentedItem::ParsingError(Error::DocCommentParsingError { span, .. }) => {
                Box::new(std::iter::once(span))
            }
            DocumentedItem::ParsingError(_) => Box::new(std::iter::empty()),
        }
    }
}

/// The result of parsing and identifying doc comments in a document
#[derive(Debug)]
pub struct ParsedDocument {
    /// A unique ID for the document given by the parser
    ///
    /// Can be used to retrieve the document contents after parsing (via [`Parse::get_sources`]).
    pub id: DocumentId,

    /// The doc comments which contain at least one tag, in source order
    pub documents: Vec<DocumentedItem>,
}

/// The trait implemented by all parsers
///
/// Ideally, cloning a parser should not duplicate the contents of the sources. The underlying data should be wrapped
/// in an [`Arc`][std::sync::Arc], so that the last clone of a parser is able to retrieve the sources' contents for
/// all files.
pub trait Parse: Clone {
    /// Parse a document from a reader and identify the doc comments and their owners
    ///
    /// If a path is provided, then this can be used to enrich diagnostics.
    fn parse_document(
        &mut self,
        input: impl io::Read,
        path: Option<impl AsRef<Path>>,
        keep_contents: bool,
    ) -> Result<ParsedDocument>;

    /// Retrieve the contents of the source files after parsing is done
    ///
    /// This consumes the parser, so that ownership of the contents can be retrieved safely.
    /// Note that documents which were parsed with `keep_contents` to `false` will no be present in the map.
    ///
    /// This can return an error if there are more than one clone of the parser.
    fn get_sources(self) -> Result<HashMap<DocumentId, String>>;
}

/// Complete the [`TextRange`]s of a list of [`DocumentedItem`].
///
/// Parsers only fill in the utf-8 byte offsets, this function computes the line, column and utf-16 offsets.
pub fn complete_text_ranges(source: &str, documents: &mut [DocumentedItem]) {
    let mut offsets: Vec<usize> = documents
        .iter_mut()
        .flat_map(DocumentedItem::spans_mut)
        .flat_map(|span| [span.start.utf8, span.end.utf8])
        .collect();
    if offsets.is_empty() {
        return;
    }
    offsets.sort_unstable();
    offsets.dedup();

    let text_indices = compute_indices(source, &offsets);
    let lookup = |offset: usize| -> TextIndex {
        let idx = text_indices.partition_point(|ti| ti.utf8 < offset);
        text_indices
            .get(idx)
            .or(text_indices.last())
            .copied()
            .unwrap_or(TextIndex::ZERO)
    };
    for span in documents.iter_mut().flat_map(DocumentedItem::spans_mut) {
        span.start = lookup(span.start.utf8);
        span.end = lookup(span.end.utf8);
    }
}
