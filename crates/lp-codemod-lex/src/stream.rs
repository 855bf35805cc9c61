use crate::lexer::{Token, TokenKind, tokenize};
use crate::Span;

/// The non-trivia tokens of a source file, indexed from zero.
///
/// Every index taken or returned by the methods below refers to this
/// code-token view; whitespace and comments are skipped but still reachable
/// through the spans, so slicing between two tokens yields the original text.
pub struct TokenStream<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    /// Partner of each `(`, `[`, `{` and its closer
    partner: Vec<Option<usize>>,
    /// Innermost open bracket enclosing each token
    parent: Vec<Option<usize>>,
}

impl<'a> TokenStream<'a> {
    pub fn new(source: &'a str) -> Self {
        let tokens: Vec<Token> = tokenize(source)
            .into_iter()
            .filter(|t| !t.is_trivia())
            .collect();

        let mut partner = vec![None; tokens.len()];
        let mut parent = vec![None; tokens.len()];
        let mut stack: Vec<usize> = Vec::new();
        for (i, token) in tokens.iter().enumerate() {
            let text = token.text(source);
            let is_close = token.kind == TokenKind::Punct && matches!(text, ")" | "]" | "}");
            if is_close {
                if let Some(&open) = stack.last() {
                    if closer_for(tokens[open].text(source)) == Some(text) {
                        stack.pop();
                        partner[open] = Some(i);
                        partner[i] = Some(open);
                    }
                }
            }
            parent[i] = stack.last().copied();
            if token.kind == TokenKind::Punct && closer_for(text).is_some() {
                stack.push(i);
            }
        }

        Self {
            source,
            tokens,
            partner,
            parent,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token(&self, i: usize) -> Token {
        self.tokens[i]
    }

    pub fn kind(&self, i: usize) -> TokenKind {
        self.tokens[i].kind
    }

    pub fn span(&self, i: usize) -> Span {
        self.tokens[i].span
    }

    pub fn text(&self, i: usize) -> &'a str {
        self.tokens[i].text(self.source)
    }

    /// Span from the start of token `first` to the end of token `last`
    pub fn span_of(&self, first: usize, last: usize) -> Span {
        Span::new(self.tokens[first].span.start, self.tokens[last].span.end)
    }

    pub fn is_ident(&self, i: usize, name: &str) -> bool {
        i < self.len() && self.kind(i) == TokenKind::Ident && self.text(i) == name
    }

    pub fn is_punct(&self, i: usize, punct: &str) -> bool {
        i < self.len() && self.kind(i) == TokenKind::Punct && self.text(i) == punct
    }

    /// True when token `i` directly follows token `i - 1` with nothing in between
    pub fn is_glued(&self, i: usize) -> bool {
        i > 0 && i < self.len() && self.tokens[i - 1].span.end == self.tokens[i].span.start
    }

    /// Matching bracket for a `(`, `[`, `{` or its closer
    pub fn partner(&self, i: usize) -> Option<usize> {
        self.partner.get(i).copied().flatten()
    }

    /// Innermost `(`, `[` or `{` that encloses token `i`
    pub fn enclosing(&self, i: usize) -> Option<usize> {
        self.parent.get(i).copied().flatten()
    }

    /// Bracket nesting depth of token `i` (top-level tokens are at depth 0)
    pub fn depth(&self, i: usize) -> usize {
        let mut depth = 0;
        let mut cursor = self.enclosing(i);
        while let Some(open) = cursor {
            depth += 1;
            cursor = self.enclosing(open);
        }
        depth
    }

    /// Whether the `<` at `i` opens a generic argument list.
    ///
    /// `Vec<T>` and `::<T>` do; `a < b` does not. The check is lexical: the
    /// `<` must be glued to a preceding identifier or `::`.
    pub fn opens_generic(&self, i: usize) -> bool {
        self.is_punct(i, "<")
            && self.is_glued(i)
            && (self.kind(i - 1) == TokenKind::Ident || self.is_punct(i - 1, "::"))
    }

    /// Index of the first token whose span starts at or after `offset`
    pub fn index_at(&self, offset: usize) -> usize {
        self.tokens.partition_point(|t| t.span.start < offset)
    }
}

fn closer_for(open: &str) -> Option<&'static str> {
    match open {
        "(" => Some(")"),
        "[" => Some("]"),
        "{" => Some("}"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivia_is_skipped() {
        let ts = TokenStream::new("a /* b */ c // d\n e");
        let texts: Vec<&str> = (0..ts.len()).map(|i| ts.text(i)).collect();
        assert_eq!(texts, vec!["a", "c", "e"]);
    }

    #[test]
    fn test_bracket_pairing() {
        let ts = TokenStream::new("f(a, [b], {c})");
        assert_eq!(ts.partner(1), Some(11));
        assert_eq!(ts.partner(4), Some(6));
        assert_eq!(ts.enclosing(5), Some(4));
        assert_eq!(ts.enclosing(4), Some(1));
        assert_eq!(ts.enclosing(0), None);
        assert_eq!(ts.depth(5), 2);
    }

    #[test]
    fn test_brackets_inside_strings_are_ignored() {
        let ts = TokenStream::new(r#"f(")", x)"#);
        assert_eq!(ts.partner(1), Some(5));
    }

    #[test]
    fn test_opens_generic() {
        let ts = TokenStream::new("Vec<u8> a < b f::<T>");
        assert!(ts.opens_generic(1));
        assert!(!ts.opens_generic(5));
        assert!(ts.opens_generic(9));
    }

    #[test]
    fn test_index_at() {
        let ts = TokenStream::new("ab cd ef");
        assert_eq!(ts.index_at(0), 0);
        assert_eq!(ts.index_at(3), 1);
        assert_eq!(ts.index_at(4), 2);
        assert_eq!(ts.index_at(100), 3);
    }
}
