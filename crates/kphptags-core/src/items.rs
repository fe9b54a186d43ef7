//! Argument items of a doc tag
//!
//! A tag such as `@kphp-warn-performance all !array-reserve` carries a list of argument items. The list is produced
//! once by the doc comment parser and only read afterwards: it can be walked with an iterator, or as a linked sequence
//! starting at [`ArgumentList::head`] and following [`ItemRef::next`].
use serde::Serialize;

use crate::textindex::TextRange;

/// The marker which negates an item
pub const NEGATION_MARKER: char = '!';

/// A single argument token in a tag's argument list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, bon::Builder)]
#[non_exhaustive]
#[builder(on(String, into))]
pub struct ArgumentItem {
    /// The item name, without the negation marker
    pub name: String,

    /// Whether the token was prefixed with [`NEGATION_MARKER`]
    #[builder(default)]
    pub negated: bool,

    /// The span of the whole token, including the negation marker
    #[builder(default)]
    pub span: TextRange,
}

impl ArgumentItem {
    /// Create an item without position information
    pub fn new(name: impl Into<String>, negated: bool) -> Self {
        Self {
            name: name.into(),
            negated,
            span: TextRange::default(),
        }
    }

    /// Parse a raw token, stripping the negation marker if present
    ///
    /// ```
    /// # use kphptags_core::items::ArgumentItem;
    /// let item = ArgumentItem::from_token("!array-reserve");
    /// assert_eq!(item.name, "array-reserve");
    /// assert!(item.negated);
    /// ```
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token.strip_prefix(NEGATION_MARKER) {
            Some(name) => Self::new(name, true),
            None => Self::new(token, false),
        }
    }
}

/// The ordered, owned list of argument items of one tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ArgumentList {
    items: Vec<ArgumentItem>,
}

impl ArgumentList {
    /// Parse a whitespace-separated list of tokens, without position information
    ///
    /// Mostly useful for tests and for tooling which only deals with the argument text.
    #[must_use]
    pub fn from_tokens(text: &str) -> Self {
        text.split_whitespace()
            .map(ArgumentItem::from_token)
            .collect()
    }

    /// The first item of the list, if any
    #[must_use]
    pub fn head(&self) -> Option<ItemRef<'_>> {
        (!self.items.is_empty()).then_some(ItemRef {
            list: self,
            index: 0,
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ArgumentItem> {
        self.items.iter()
    }

    /// Mutable access to the spans, used to fill in line and column information after parsing
    pub(crate) fn spans_mut(&mut self) -> impl Iterator<Item = &mut TextRange> {
        self.items.iter_mut().map(|i| &mut i.span)
    }
}

impl From<Vec<ArgumentItem>> for ArgumentList {
    fn from(items: Vec<ArgumentItem>) -> Self {
        Self { items }
    }
}

impl FromIterator<ArgumentItem> for ArgumentList {
    fn from_iter<T: IntoIterator<Item = ArgumentItem>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ArgumentList {
    type Item = &'a ArgumentItem;
    type IntoIter = std::slice::Iter<'a, ArgumentItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// A read-only cursor on an item of an [`ArgumentList`]
///
/// Traversal is forward-only: each item knows its successor and nothing else.
#[derive(Debug, Clone, Copy)]
pub struct ItemRef<'a> {
    list: &'a ArgumentList,
    index: usize,
}

impl<'a> ItemRef<'a> {
    /// The item this cursor points to
    #[must_use]
    pub fn item(&self) -> &'a ArgumentItem {
        &self.list.items[self.index]
    }

    /// The following item in the list, or `None` for the last item
    #[must_use]
    pub fn next(&self) -> Option<ItemRef<'a>> {
        let index = self.index + 1;
        (index < self.list.items.len()).then_some(ItemRef {
            list: self.list,
            index,
        })
    }
}

impl std::ops::Deref for ItemRef<'_> {
    type Target = ArgumentItem;

    fn deref(&self) -> &Self::Target {
        self.item()
    }
}
