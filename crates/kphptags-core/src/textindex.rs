//! A text index type
//!
//! The [`TextIndex`] type holds the line, column (both zero-indexed) and utf-8/utf-16 offsets for a given position
//! in the text. Parsers in this crate only know about utf-8 byte offsets, the other fields are filled in afterwards
//! with [`compute_indices`].
use std::{fmt, ops::Range};

use serde::Serialize;

/// A span of source code
pub type TextRange = Range<TextIndex>;

/// A position inside of the source code
///
/// Lines and columns start at 0.
#[derive(Default, Hash, Copy, Clone, PartialEq, Eq, Debug, Serialize)]
pub struct TextIndex {
    pub utf8: usize,
    pub utf16: usize,
    pub line: usize,
    pub column: usize,
}

impl TextIndex {
    /// Shorthand for `TextIndex { utf8: 0, utf16: 0, line: 0, column: 0 }`.
    pub const ZERO: TextIndex = TextIndex {
        utf8: 0,
        utf16: 0,
        line: 0,
        column: 0,
    };

    /// Create an index which only knows its utf-8 byte offset
    ///
    /// The other fields are populated by [`compute_indices`].
    #[must_use]
    pub const fn from_utf8(utf8: usize) -> Self {
        TextIndex {
            utf8,
            utf16: 0,
            line: 0,
            column: 0,
        }
    }

    /// Advance the index, accounting for lf/nl/ls/ps characters and combinations.
    ///
    /// A `\r\n` sequence counts as a single line return.
    #[inline]
    pub fn advance(&mut self, c: char, next: Option<&char>) {
        self.utf8 += c.len_utf8();
        self.utf16 += c.len_utf16();
        match (c, next) {
            ('\r', Some(&'\n')) => {
                // the line number gets incremented when we process the \n
            }
            ('\n' | '\r' | '\u{2028}' | '\u{2029}', _) => {
                self.line += 1;
                self.column = 0;
            }
            _ => {
                self.column += 1;
            }
        }
    }
}

impl fmt::Display for TextIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

impl PartialOrd for TextIndex {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TextIndex {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.utf8.cmp(&other.utf8)
    }
}

/// Compute the [`TextIndex`] list corresponding to the byte offsets in the given source.
///
/// The list of offsets _MUST_ be sorted, but it can contain duplicates. The output contains one entry per distinct
/// offset, in order. Offsets that fall in the middle of a multi-byte character resolve to the next character boundary
/// and offsets past the end of the source resolve to the end of the source.
pub fn compute_indices(source: &str, offsets: &[usize]) -> Vec<TextIndex> {
    let mut text_indices = Vec::with_capacity(offsets.len());
    let mut ofs_iter = offsets.iter().copied().peekable();
    let mut current = TextIndex::ZERO;
    let mut chars = source.chars().peekable();
    while let Some(&next_offset) = ofs_iter.peek() {
        if current.utf8 >= next_offset {
            text_indices.push(current);
            // skip duplicates
            while ofs_iter.next_if(|o| *o <= current.utf8).is_some() {}
            continue;
        }
        let Some(c) = chars.next() else {
            break;
        };
        current.advance(c, chars.peek());
    }
    // remaining offsets are past the end of the source
    if ofs_iter.peek().is_some() {
        text_indices.push(current);
    }
    text_indices
}
