use ra_ap_syntax::{AstNode, Edition, SourceFile, SyntaxKind};

use crate::Span;

/// The kind of a lexed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Identifier or keyword, including raw identifiers (`r#type`)
    Ident,
    /// Lifetime or label (`'a`, `'static`)
    Lifetime,
    /// String, byte string, raw string, char or numeric literal
    Literal,
    /// Punctuation; `::`, `->`, `=>`, `..`, `..=` and `...` are single tokens
    Punct,
    LineComment,
    BlockComment,
    Whitespace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Whitespace and comments
    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment
        )
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.slice(source)
    }
}

const MULTI_CHAR_PUNCT: &[&str] = &["..=", "...", "::", "->", "=>", ".."];

/// Split `source` into tokens.
///
/// The tokens are the leaves of rust-analyzer's lossless syntax tree, so
/// their spans tile `source` exactly, even for input that does not parse.
/// Punctuation is first split into single characters and then re-joined by
/// adjacency alone. A pattern tokenizes the same way as the code it is
/// matched against, whatever the parser made of either.
pub fn tokenize(source: &str) -> Vec<Token> {
    let file = SourceFile::parse(source, Edition::Edition2021).tree();

    let mut leaves = Vec::new();
    for token in file
        .syntax()
        .descendants_with_tokens()
        .filter_map(|element| element.into_token())
    {
        let range = token.text_range();
        let span = Span::new(range.start().into(), range.end().into());
        match classify(token.kind(), token.text()) {
            Some(kind) => leaves.push(Token { kind, span }),
            None => {
                let mut start = span.start;
                for c in token.text().chars() {
                    let end = start + c.len_utf8();
                    leaves.push(Token {
                        kind: TokenKind::Punct,
                        span: Span::new(start, end),
                    });
                    start = end;
                }
            }
        }
    }

    let tokens = glue_punct(source, &leaves);
    log::trace!("Tokenized {} bytes into {} tokens", source.len(), tokens.len());
    tokens
}

/// Token kind for a syntax-tree leaf, or `None` for punctuation
fn classify(kind: SyntaxKind, text: &str) -> Option<TokenKind> {
    match kind {
        SyntaxKind::WHITESPACE => Some(TokenKind::Whitespace),
        SyntaxKind::COMMENT if text.starts_with("//") => Some(TokenKind::LineComment),
        SyntaxKind::COMMENT => Some(TokenKind::BlockComment),
        SyntaxKind::SHEBANG => Some(TokenKind::LineComment),
        SyntaxKind::LIFETIME_IDENT => Some(TokenKind::Lifetime),
        SyntaxKind::INT_NUMBER
        | SyntaxKind::FLOAT_NUMBER
        | SyntaxKind::CHAR
        | SyntaxKind::BYTE
        | SyntaxKind::STRING
        | SyntaxKind::BYTE_STRING
        | SyntaxKind::C_STRING => Some(TokenKind::Literal),
        _ if text.starts_with(|c: char| c == '_' || c.is_alphabetic()) => Some(TokenKind::Ident),
        _ => None,
    }
}

fn glue_punct(source: &str, leaves: &[Token]) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(leaves.len());
    let mut i = 0;
    while i < leaves.len() {
        let token = leaves[i];
        let width = if token.kind == TokenKind::Punct {
            MULTI_CHAR_PUNCT
                .iter()
                .find(|punct| spells(source, &leaves[i..], punct))
                .map_or(1, |punct| punct.len())
        } else {
            1
        };
        tokens.push(Token {
            kind: token.kind,
            span: Span::new(token.span.start, leaves[i + width - 1].span.end),
        });
        i += width;
    }
    tokens
}

/// Whether the leading single-character punct leaves spell `punct` with no gaps
fn spells(source: &str, leaves: &[Token], punct: &str) -> bool {
    let Some(run) = leaves.get(..punct.len()) else {
        return false;
    };
    let start = run[0].span.start;
    run.iter().all(|t| t.kind == TokenKind::Punct)
        && run[run.len() - 1].span.end == start + punct.len()
        && source.get(start..start + punct.len()) == Some(punct)
}
