//! PHP Doc Comment Parser
//!
//! Turns the text of a `/** ... */` comment into the list of tags it contains. Each tag keeps the whitespace-separated
//! tokens that follow its name on the same line as [`ArgumentItem`]s.
use winnow::{
    Parser as _, Result,
    token::{take_till, take_while},
};

use crate::{
    error::{Error, Result as KtResult},
    items::{ArgumentItem, ArgumentList},
    textindex::{TextIndex, TextRange},
};

/// The tags found in a doc comment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocComment {
    /// The span of the whole comment, delimiters included
    pub span: TextRange,

    pub tags: Vec<DocTag>,
}

impl DocComment {
    /// Whether the comment contains a tag with the given name (including the `@`)
    #[must_use]
    pub fn contains_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name == name)
    }

    /// Mutable access to all the spans in the comment
    pub(crate) fn spans_mut(&mut self) -> impl Iterator<Item = &mut TextRange> {
        std::iter::once(&mut self.span).chain(self.tags.iter_mut().flat_map(DocTag::spans_mut))
    }
}

/// A single tag inside of a doc comment, e.g. `@kphp-warn-performance all !array-reserve`
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder)]
#[non_exhaustive]
#[builder(on(String, into))]
pub struct DocTag {
    /// The tag name, including the leading `@`
    pub name: String,

    /// The span of the tag name
    #[builder(default)]
    pub name_span: TextRange,

    /// The span from the `@` up to the end of the last argument
    #[builder(default)]
    pub span: TextRange,

    #[builder(default)]
    pub arguments: ArgumentList,
}

impl DocTag {
    fn spans_mut(&mut self) -> impl Iterator<Item = &mut TextRange> {
        [&mut self.name_span, &mut self.span]
            .into_iter()
            .chain(self.arguments.spans_mut())
    }
}

fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | ':' | '\\')
}

fn is_inline_space(c: char) -> bool {
    c.is_whitespace() && c != '\n' && c != '\r'
}

/// Whitespace and leading asterisks at the start of a comment line
fn line_prefix(input: &mut &str) -> Result<()> {
    (
        take_while(0.., is_inline_space),
        take_while(0.., '*'),
        take_while(0.., is_inline_space),
    )
        .void()
        .parse_next(input)
}

fn blank(input: &mut &str) -> Result<()> {
    take_while(0.., is_inline_space).void().parse_next(input)
}

fn tag_name<'s>(input: &mut &'s str) -> Result<&'s str> {
    ('@', take_while(1.., is_tag_char))
        .take()
        .parse_next(input)
}

fn argument<'s>(input: &mut &'s str) -> Result<&'s str> {
    take_till(1.., char::is_whitespace).parse_next(input)
}

/// Parse one line of the comment body, returning a tag if the line starts with one
///
/// `line_offset` is the absolute byte offset of the first character of the line.
fn parse_tag_line(line: &str, line_offset: usize) -> Result<Option<DocTag>> {
    let pos = |rest: &str| TextIndex::from_utf8(line_offset + line.len() - rest.len());
    let mut input = line;
    line_prefix(&mut input)?;
    let start = pos(input);
    let Ok(name) = tag_name(&mut input) else {
        return Ok(None);
    };
    let name_span = start..pos(input);
    let mut items = Vec::new();
    loop {
        blank(&mut input)?;
        if input.is_empty() || input.starts_with(['\r', '\n']) {
            break;
        }
        let item_start = pos(input);
        let token = argument(&mut input)?;
        let mut item = ArgumentItem::from_token(token);
        item.span = item_start..pos(input);
        items.push(item);
    }
    let end = items.last().map_or(name_span.end, |i| i.span.end);
    Ok(Some(DocTag {
        name: name.to_string(),
        name_span,
        span: start..end,
        arguments: items.into(),
    }))
}

/// Parse a doc comment starting at byte `offset` in its source file
///
/// All the spans in the output are absolute byte offsets; their line and column information must be completed by the
/// caller if needed.
pub fn parse_doc_comment(text: &str, offset: usize) -> KtResult<DocComment> {
    let span = TextIndex::from_utf8(offset)..TextIndex::from_utf8(offset + text.len());
    let Some(body) = text
        .strip_prefix("/**")
        .and_then(|body| body.strip_suffix("*/"))
    else {
        return Err(Error::DocCommentParsingError {
            span,
            message: "a doc comment must start with `/**` and end with `*/`".to_string(),
        });
    };
    // `**/` endings
    let body = body.trim_end_matches('*');
    let mut tags = Vec::new();
    let mut line_offset = offset + 3;
    for line in body.split_inclusive('\n') {
        let tag = parse_tag_line(line, line_offset).map_err(|e| Error::DocCommentParsingError {
            span: TextIndex::from_utf8(line_offset)..TextIndex::from_utf8(line_offset + line.len()),
            message: e.to_string(),
        })?;
        tags.extend(tag);
        line_offset += line.len();
    }
    Ok(DocComment { span, tags })
}
