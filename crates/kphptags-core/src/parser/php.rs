//! A lightweight PHP lexer
//!
//! This is not a full PHP parser: it only knows enough of the lexical structure (strings, heredocs, comments,
//! attributes, open and close tags) to find doc comments reliably, and enough of the declaration syntax to tell what
//! kind of declaration follows each doc comment.
use std::{
    collections::HashMap,
    io,
    ops::Range,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use tracing::trace;
use winnow::{
    Parser as _, Result as LexResult,
    ascii::{Caseless, multispace1, space0},
    combinator::{alt, not, opt, preceded, repeat, terminated},
    token::{any, literal, one_of, rest, take_till, take_until, take_while},
};

use crate::{
    declaration::{Declaration, DeclarationKind},
    doccomment::parse_doc_comment,
    error::{Error, Result},
    parser::{DocumentId, DocumentedItem, Parse, ParsedDocument, complete_text_ranges},
    prelude::OrPanic as _,
    textindex::{TextIndex, TextRange},
};

type Documents = Vec<(DocumentId, String)>;

/// Keywords which only appear in front of class members (or promoted constructor parameters)
///
/// `static` is handled separately since it also marks static closures.
const MEMBER_MODIFIERS: &[&str] = &[
    "public",
    "protected",
    "private",
    "abstract",
    "final",
    "readonly",
    "var",
];

/// A parser for PHP source files
#[derive(Debug, Clone, Default)]
pub struct PhpParser {
    documents: Arc<Mutex<Documents>>,
}

impl PhpParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Parse for PhpParser {
    fn parse_document(
        &mut self,
        input: impl io::Read,
        path: Option<impl AsRef<Path>>,
        keep_contents: bool,
    ) -> Result<ParsedDocument> {
        fn inner(
            this: &mut PhpParser,
            mut input: impl io::Read,
            path: Option<PathBuf>,
            keep_contents: bool,
        ) -> Result<ParsedDocument> {
            let pathbuf = path.unwrap_or(PathBuf::from("<stdin>"));
            let mut buf = String::new();
            input
                .read_to_string(&mut buf)
                .map_err(|err| Error::IOError {
                    path: pathbuf.clone(),
                    err,
                })?;
            let mut documents = find_documented_items(&buf);
            trace!(path = ?pathbuf, count = documents.len(), "found doc comments");
            complete_text_ranges(&buf, &mut documents);

            let document_id = DocumentId::new();
            if keep_contents {
                let mut sources = this
                    .documents
                    .lock()
                    .or_panic("mutex should not be poisoned");
                sources.push((document_id, buf));
            }
            Ok(ParsedDocument {
                id: document_id,
                documents,
            })
        }
        inner(
            self,
            input,
            path.map(|p| p.as_ref().to_path_buf()),
            keep_contents,
        )
    }

    fn get_sources(self) -> Result<HashMap<DocumentId, String>> {
        Ok(Arc::try_unwrap(self.documents)
            .map_err(|_| Error::DanglingParserReferences)?
            .into_inner()
            .or_panic("mutex should not be poisoned")
            .into_iter()
            .collect())
    }
}

/// Find all doc comments containing at least one tag, together with the declaration they decorate
///
/// Spans only contain utf-8 offsets.
pub fn find_documented_items(source: &str) -> Vec<DocumentedItem> {
    let mut out = Vec::new();
    for range in doc_comments(source) {
        match parse_doc_comment(&source[range.clone()], range.start) {
            Ok(comment) => {
                if comment.tags.is_empty() {
                    continue;
                }
                let owner = find_owner(source, range.end);
                out.push(DocumentedItem::Commented { owner, comment });
            }
            Err(err) => out.push(DocumentedItem::ParsingError(err)),
        }
    }
    out
}

fn is_ident_char(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric() || !c.is_ascii()
}

/// The lexical elements which matter to find doc comments and their owners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'s> {
    /// A `/** */` comment
    DocComment,
    /// Whitespace, regular comments and attributes
    Trivia,
    /// The `?>` close tag, which switches back to inline HTML
    CloseTag,
    /// A string or a heredoc
    Literal,
    Variable(&'s str),
    Word(&'s str),
    Punct(char),
}

fn ident<'s>(input: &mut &'s str) -> LexResult<&'s str> {
    take_while(1.., is_ident_char).parse_next(input)
}

/// Inline HTML up to and including the next open tag (`<?php`, `<?=` or `<?`)
fn inline_html(input: &mut &str) -> LexResult<()> {
    alt((
        (
            take_until(0.., "<?"),
            "<?",
            opt(alt((literal(Caseless("php")), "="))),
        )
            .void(),
        rest.void(),
    ))
    .parse_next(input)
}

/// A single, double or backtick quoted string, possibly unterminated
fn quoted(input: &mut &str) -> LexResult<()> {
    let quote = one_of(['\'', '"', '`']).parse_next(input)?;
    repeat::<_, _, (), _, _>(
        0..,
        alt((take_till(1.., [quote, '\\']).void(), ('\\', opt(any)).void())),
    )
    .parse_next(input)?;
    opt(quote).void().parse_next(input)
}

/// A heredoc or nowdoc, up to and including its closing label
fn heredoc(input: &mut &str) -> LexResult<()> {
    let label = preceded(("<<<", space0, opt(one_of(['\'', '"']))), ident).parse_next(input)?;
    loop {
        let _: &str = take_till(0.., '\n').parse_next(input)?;
        if opt('\n').parse_next(input)?.is_none() {
            return Ok(());
        }
        // the closing label starts a line, after optional indentation
        space0.parse_next(input)?;
        if opt((label, not(one_of(is_ident_char))))
            .parse_next(input)?
            .is_some()
        {
            return Ok(());
        }
    }
}

/// A `//` or `#` comment, which ends before the line ending or a close tag
fn line_comment(input: &mut &str) -> LexResult<()> {
    (
        alt(("//", "#")),
        repeat::<_, _, (), _, _>(
            0..,
            alt((take_till(1.., ['\n', '?']).void(), ('?', not('>')).void())),
        ),
    )
        .void()
        .parse_next(input)
}

/// A block comment, its text included its delimiters
///
/// An unterminated comment extends to the end of the source.
fn block_comment<'s>(input: &mut &'s str) -> LexResult<&'s str> {
    (
        "/*",
        alt((terminated(take_until(0.., "*/"), "*/").void(), rest.void())),
    )
        .take()
        .parse_next(input)
}

/// The contents of a bracket group after its opening `[`, up to and including the matching `]`
fn bracketed(input: &mut &str) -> LexResult<()> {
    (
        repeat::<_, _, (), _, _>(
            0..,
            alt((
                take_till(1.., ['[', ']', '\'', '"']).void(),
                quoted,
                ('[', bracketed).void(),
            )),
        ),
        opt(']'),
    )
        .void()
        .parse_next(input)
}

/// An attribute group like `#[Pure, Deprecated('[reason]')]`
fn attribute(input: &mut &str) -> LexResult<()> {
    ("#[", bracketed).void().parse_next(input)
}

fn token<'s>(input: &mut &'s str) -> LexResult<Token<'s>> {
    alt((
        multispace1.value(Token::Trivia),
        block_comment.map(|text: &str| {
            // `/**/` is an empty regular comment
            if text.starts_with("/**") && !text.starts_with("/**/") {
                Token::DocComment
            } else {
                Token::Trivia
            }
        }),
        attribute.value(Token::Trivia),
        line_comment.value(Token::Trivia),
        "?>".value(Token::CloseTag),
        alt((quoted, heredoc)).value(Token::Literal),
        preceded('$', ident).map(Token::Variable),
        ident.map(Token::Word),
        any.map(Token::Punct),
    ))
    .parse_next(input)
}

/// An iterator over the tokens of PHP code, with their byte ranges
struct Lexer<'s> {
    source: &'s str,
    input: &'s str,
}

impl<'s> Lexer<'s> {
    /// Start lexing PHP code at byte `offset`
    fn at(source: &'s str, offset: usize) -> Self {
        Self {
            source,
            input: &source[offset..],
        }
    }

    fn offset(&self) -> usize {
        self.source.len() - self.input.len()
    }

    fn skip_html(&mut self) {
        let _ = inline_html(&mut self.input);
    }
}

impl<'s> Iterator for Lexer<'s> {
    type Item = (Token<'s>, Range<usize>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.input.is_empty() {
            return None;
        }
        let start = self.offset();
        // never fails on a non-empty input since any char is a token
        let token = token(&mut self.input).ok()?;
        Some((token, start..self.offset()))
    }
}

/// The byte ranges of all doc comments in a source file, in source order
fn doc_comments(source: &str) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut lexer = Lexer::at(source, 0);
    lexer.skip_html();
    while let Some((token, range)) = lexer.next() {
        match token {
            Token::DocComment => out.push(range),
            Token::CloseTag => lexer.skip_html(),
            _ => {}
        }
    }
    out
}

fn text_range(range: Range<usize>) -> TextRange {
    TextIndex::from_utf8(range.start)..TextIndex::from_utf8(range.end)
}

fn other(range: Range<usize>) -> Declaration {
    Declaration {
        kind: DeclarationKind::Other,
        name: String::new(),
        span: text_range(range),
    }
}

/// Identify the declaration which starts after a doc comment ending at byte `offset`
///
/// The span of the declaration goes from its first modifier or keyword to the end of its name.
fn find_owner(source: &str, offset: usize) -> Declaration {
    let mut tokens =
        Lexer::at(source, offset).filter(|(token, _)| !matches!(token, Token::Trivia));
    let mut start = None;
    let mut member = false;
    let mut is_static = false;
    while let Some((token, range)) = tokens.next() {
        let start = *start.get_or_insert(range.start);
        let has_modifier = member || is_static;
        let word = match token {
            Token::Word(word) => word,
            Token::Variable(name) => {
                let kind = if has_modifier {
                    DeclarationKind::Property
                } else {
                    DeclarationKind::Other
                };
                return Declaration {
                    kind,
                    name: name.to_string(),
                    span: text_range(start..range.end),
                };
            }
            // property types: nullable, union, intersection, DNF and namespaced types
            Token::Punct('?' | '|' | '&' | '(' | ')' | '\\') if has_modifier => continue,
            // the next doc comment starts a new item
            Token::DocComment => return other(offset..offset),
            _ => return other(range.start..range.start),
        };
        let keyword = word.to_ascii_lowercase();
        if keyword == "static" {
            is_static = true;
            continue;
        }
        if MEMBER_MODIFIERS.contains(&keyword.as_str()) {
            member = true;
            continue;
        }
        let kind = match keyword.as_str() {
            "function" | "fn" => DeclarationKind::Function,
            "class" => DeclarationKind::Class,
            "interface" => DeclarationKind::Interface,
            "trait" => DeclarationKind::Trait,
            "enum" => DeclarationKind::Enum,
            "const" => DeclarationKind::Constant,
            // a property type
            _ if has_modifier => continue,
            _ => return other(range),
        };
        let name = declaration_name(&mut tokens, kind);
        let kind = match kind {
            // static closures have no name
            DeclarationKind::Function if member || (is_static && name.is_some()) => {
                DeclarationKind::Method
            }
            kind => kind,
        };
        let end = name.as_ref().map_or(range.end, |(_, r)| r.end);
        return Declaration {
            kind,
            name: name.map(|(n, _)| n.to_string()).unwrap_or_default(),
            span: text_range(start..end),
        };
    }
    other(offset..offset)
}

/// Read the name following a declaration keyword, if any (closures and arrow functions have none)
fn declaration_name<'s>(
    tokens: &mut impl Iterator<Item = (Token<'s>, Range<usize>)>,
    kind: DeclarationKind,
) -> Option<(&'s str, Range<usize>)> {
    let mut next = tokens.next()?;
    if kind.is_function_like() && next.0 == Token::Punct('&') {
        // returns by reference
        next = tokens.next()?;
    }
    let (Token::Word(mut name), mut range) = next else {
        return None;
    };
    if kind == DeclarationKind::Constant {
        // typed class constants: the name is the last identifier before `=`
        while let Some((Token::Word(word), r)) = tokens.next() {
            name = word;
            range = r;
        }
    }
    Some((name, range))
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    fn owners(source: &str) -> Vec<(DeclarationKind, String)> {
        find_documented_items(source)
            .into_iter()
            .filter_map(|item| match item {
                DocumentedItem::Commented { owner, .. } => Some((owner.kind, owner.name)),
                DocumentedItem::ParsingError(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_function() {
        let source = "<?php
/** @kphp-warn-performance all */
function foo() {}
";
        assert_eq!(
            owners(source),
            vec![(DeclarationKind::Function, "foo".to_string())]
        );
    }

    #[test]
    fn test_class_members() {
        let source = "<?php
/**
 * @kphp-immutable-class
 */
final class A {
    /** @var int */
    private ?int $x = 0;

    /** @var int */
    const int LIMIT = 10;

    /**
     * @kphp-warn-performance array-reserve
     */
    #[Pure]
    public static function &bar(): int {}

    /** @kphp-analyze-performance all */
    function baz() {}
}
";
        assert_eq!(
            owners(source),
            vec![
                (DeclarationKind::Class, "A".to_string()),
                (DeclarationKind::Property, "x".to_string()),
                (DeclarationKind::Constant, "LIMIT".to_string()),
                (DeclarationKind::Method, "bar".to_string()),
                (DeclarationKind::Function, "baz".to_string()),
            ]
        );
    }

    #[test]
    fn test_other_declarations() {
        let source = "<?php
/** @kphp-warn-performance all */
interface I {}
/** @kphp-warn-performance all */
trait T {}
/** @kphp-warn-performance all */
enum Suit: string {}
/** @var int[] $x */
$x = [];
/** @kphp-warn-performance all */
$f = function() {};
/** @kphp-warn-performance all */
";
        assert_eq!(
            owners(source),
            vec![
                (DeclarationKind::Interface, "I".to_string()),
                (DeclarationKind::Trait, "T".to_string()),
                (DeclarationKind::Enum, "Suit".to_string()),
                (DeclarationKind::Other, "x".to_string()),
                (DeclarationKind::Other, "f".to_string()),
                (DeclarationKind::Other, String::new()),
            ]
        );
    }

    #[test]
    fn test_closures() {
        let source = "<?php
$f = array_map(
    /** @kphp-warn-performance all */
    function($x) { return $x; },
    /** @kphp-warn-performance all */
    static fn($x) => $x,
    $arr
);
";
        assert_eq!(
            owners(source),
            vec![
                (DeclarationKind::Function, String::new()),
                (DeclarationKind::Function, String::new()),
            ]
        );
    }

    #[test]
    fn test_static_closures_and_methods() {
        let source = "<?php
/** @kphp-warn-performance all */
$f = static function() {};
/** @kphp-warn-performance all */
static function() {};
/** @kphp-warn-performance all */
static fn($x) => $x;
class A {
    /** @kphp-warn-performance all */
    static function create() {}
}
";
        assert_eq!(
            owners(source),
            vec![
                (DeclarationKind::Other, "f".to_string()),
                (DeclarationKind::Function, String::new()),
                (DeclarationKind::Function, String::new()),
                (DeclarationKind::Method, "create".to_string()),
            ]
        );
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let source = "<?php
/** @kphp-warn-performance all */
PUBLIC Function Foo() {}
";
        assert_eq!(
            owners(source),
            vec![(DeclarationKind::Method, "Foo".to_string())]
        );
    }

    #[test]
    fn test_strings_and_comments_are_skipped() {
        let source = r#"<?php
$a = "/** @kphp-warn-performance all */";
$b = '/** @kphp-warn-performance all */ \' ';
// /** @kphp-warn-performance all */
# /** @kphp-warn-performance all */
/* /** @kphp-warn-performance all */
$c = <<<EOT
  /** @kphp-warn-performance all */
  EOT;
/**/
/** no tags here */
/** @kphp-warn-performance all */
function real() {}
"#;
        assert_eq!(
            owners(source),
            vec![(DeclarationKind::Function, "real".to_string())]
        );
    }

    #[test]
    fn test_inline_html() {
        let source = "<html>It's /** @kphp-warn-performance all */</html>
<?php
/** @kphp-warn-performance all */
function a() {} ?>
<p>/** @kphp-warn-performance all */</p>
<?php /** @kphp-warn-performance all */ function b() {}
";
        assert_eq!(
            owners(source),
            vec![
                (DeclarationKind::Function, "a".to_string()),
                (DeclarationKind::Function, "b".to_string()),
            ]
        );
    }

    #[test]
    fn test_comments_between_doc_and_owner() {
        let source = "<?php
/** @kphp-warn-performance all */
// a comment
/* another one */
#[Attr('[', [1, 2])]
#[Other]
function foo() {}
/** @kphp-warn-performance all */
/** @kphp-inline */
function bar() {}
";
        assert_eq!(
            owners(source),
            vec![
                (DeclarationKind::Function, "foo".to_string()),
                (DeclarationKind::Other, String::new()),
                (DeclarationKind::Function, "bar".to_string()),
            ]
        );
    }

    #[test]
    fn test_unterminated_doc_comment() {
        let source = "<?php
/** @kphp-warn-performance all */
function foo() {}
/** @kphp-warn-performance all
function bar() {}
";
        let items = find_documented_items(source);
        assert_eq!(items.len(), 2);
        assert!(matches!(
            &items[1],
            DocumentedItem::ParsingError(Error::DocCommentParsingError { span, .. })
                if span.start.utf8 == source.rfind("/**").unwrap() && span.end.utf8 == source.len()
        ));
    }

    #[test]
    fn test_owner_span() {
        let source = "<?php\n/** @kphp-warn-performance all */\n  public function foo() {}\n";
        let mut parser = PhpParser::new();
        let doc = parser
            .parse_document(source.as_bytes(), None::<&str>, true)
            .unwrap();
        let DocumentedItem::Commented { owner, .. } = &doc.documents[0] else {
            panic!("wrong variant");
        };
        assert_eq!(owner.span.start.line, 2);
        assert_eq!(owner.span.start.column, 2);
        assert_eq!(
            &source[owner.span.start.utf8..owner.span.end.utf8],
            "public function foo"
        );
        let sources = parser.get_sources().unwrap();
        assert_eq!(sources.get(&doc.id).map(String::as_str), Some(source));
    }

    #[test]
    fn test_owner_span_starts_at_first_modifier() {
        let source = "<?php
class A {
    /** @kphp-warn-performance all */
    #[Pure]
    final public static function &bar(): int {}

    /** @var int */
    private ?int $x = 0;

    /** @kphp-warn-performance all */
    static fn() => 1;
}
";
        let spans: Vec<_> = find_documented_items(source)
            .into_iter()
            .filter_map(|item| match item {
                DocumentedItem::Commented { owner, .. } => {
                    Some(&source[owner.span.start.utf8..owner.span.end.utf8])
                }
                DocumentedItem::ParsingError(_) => None,
            })
            .collect();
        assert_eq!(
            spans,
            vec!["final public static function &bar", "private ?int $x", "static fn"]
        );
    }

    #[test]
    fn test_dangling_references() {
        let parser = PhpParser::new();
        let clone = parser.clone();
        assert!(matches!(
            parser.get_sources(),
            Err(Error::DanglingParserReferences)
        ));
        assert!(clone.get_sources().unwrap().is_empty());
    }
}
