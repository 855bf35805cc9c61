//! Token patterns with captures, and replacement templates.
//!
//! A pattern is written as ordinary Rust text and tokenized with the same
//! lexer as the files it is matched against, so whitespace and comments in
//! either never matter. Two capture forms are available:
//!
//! - `$name` captures exactly one identifier
//! - `$name..` captures a non-empty, bracket-balanced run of tokens that ends
//!   right before the next literal token of the pattern at nesting depth 0
//!
//! ```text
//! pattern:  pool.alloc_expr($kind.., $span..)?
//! template: Expr::new($kind, $span)
//! ```
//!
//! Captured text is copied verbatim from the source, nested calls and
//! generic arguments included.

use lp_codemod_lex::{Span, TokenKind, TokenStream, tokenize};
use regex::Regex;

use crate::error::{CodemodError, Result};

#[derive(Debug, Clone)]
enum Element {
    Token(TokenKind, String),
    Ident(String),
    Run(String),
}

#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    elements: Vec<Element>,
    filters: Vec<(String, Regex)>,
}

/// A successful match, in code-token indices of the stream it was found in
#[derive(Debug, Clone)]
pub struct Match {
    pub first: usize,
    pub last: usize,
    pub span: Span,
    captures: Vec<(String, Span)>,
}

impl Match {
    pub fn capture(&self, name: &str) -> Option<Span> {
        self.captures
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, span)| *span)
    }
}

impl Pattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let tokens: Vec<_> = tokenize(pattern)
            .into_iter()
            .filter(|t| t.kind != TokenKind::Whitespace)
            .collect();

        let mut elements = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let token = tokens[i];
            let text = token.text(pattern);
            match token.kind {
                TokenKind::LineComment | TokenKind::BlockComment => {
                    return Err(CodemodError::pattern(pattern, "comments are not allowed"));
                }
                TokenKind::Punct if text == "$" => {
                    let Some(name) = tokens.get(i + 1).filter(|t| t.kind == TokenKind::Ident)
                    else {
                        return Err(CodemodError::pattern(pattern, "`$` must name a capture"));
                    };
                    let name = name.text(pattern).to_string();
                    if elements.iter().any(|e| capture_name(e) == Some(name.as_str())) {
                        return Err(CodemodError::pattern(
                            pattern,
                            format!("duplicate capture `${name}`"),
                        ));
                    }
                    let is_run = tokens
                        .get(i + 2)
                        .is_some_and(|t| t.kind == TokenKind::Punct && t.text(pattern) == "..");
                    if is_run {
                        elements.push(Element::Run(name));
                        i += 3;
                    } else {
                        elements.push(Element::Ident(name));
                        i += 2;
                    }
                }
                kind => {
                    elements.push(Element::Token(kind, text.to_string()));
                    i += 1;
                }
            }
        }

        if elements.is_empty() {
            return Err(CodemodError::pattern(pattern, "pattern is empty"));
        }
        for (k, element) in elements.iter().enumerate() {
            if let Element::Run(name) = element {
                if k == 0 {
                    return Err(CodemodError::pattern(
                        pattern,
                        format!("`${name}..` cannot start a pattern"),
                    ));
                }
                if !matches!(elements.get(k + 1), Some(Element::Token(..))) {
                    return Err(CodemodError::pattern(
                        pattern,
                        format!("`${name}..` must be followed by a literal token"),
                    ));
                }
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            elements,
            filters: Vec::new(),
        })
    }

    /// Only accept matches where the `$name` capture matches `regex`
    pub fn filter(mut self, name: &str, regex: &str) -> Result<Self> {
        let known = self
            .elements
            .iter()
            .any(|e| matches!(e, Element::Ident(n) if n == name));
        if !known {
            return Err(CodemodError::pattern(
                &self.source,
                format!("no identifier capture `${name}` to filter"),
            ));
        }
        self.filters.push((name.to_string(), Regex::new(regex)?));
        Ok(self)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True when the pattern has no captures at all
    pub fn is_literal(&self) -> bool {
        self.elements.iter().all(|e| matches!(e, Element::Token(..)))
    }

    pub(crate) fn has_capture(&self, name: &str) -> bool {
        self.elements
            .iter()
            .any(|e| capture_name(e) == Some(name))
    }

    /// Try to match with the first pattern token at code token `start`
    pub fn match_at(&self, ts: &TokenStream, start: usize) -> Option<Match> {
        let mut pos = start;
        let mut captures = Vec::new();

        for (k, element) in self.elements.iter().enumerate() {
            match element {
                Element::Token(kind, text) => {
                    if pos >= ts.len() || ts.kind(pos) != *kind || ts.text(pos) != text {
                        return None;
                    }
                    pos += 1;
                }
                Element::Ident(name) => {
                    if pos >= ts.len() || ts.kind(pos) != TokenKind::Ident {
                        return None;
                    }
                    let accepted = self
                        .filters
                        .iter()
                        .filter(|(n, _)| n == name)
                        .all(|(_, re)| re.is_match(ts.text(pos)));
                    if !accepted {
                        return None;
                    }
                    captures.push((name.clone(), ts.span(pos)));
                    pos += 1;
                }
                Element::Run(name) => {
                    let Some(Element::Token(kind, text)) = self.elements.get(k + 1) else {
                        return None;
                    };
                    let end = balanced_run(ts, pos, *kind, text)?;
                    if end == pos {
                        return None;
                    }
                    captures.push((name.clone(), ts.span_of(pos, end - 1)));
                    pos = end;
                }
            }
        }

        Some(Match {
            first: start,
            last: pos - 1,
            span: ts.span_of(start, pos - 1),
            captures,
        })
    }

    /// All non-overlapping matches, left to right
    pub fn find_all(&self, ts: &TokenStream) -> Vec<Match> {
        let mut matches = Vec::new();
        let mut i = 0;
        while i < ts.len() {
            match self.match_at(ts, i) {
                Some(m) => {
                    i = m.last + 1;
                    matches.push(m);
                }
                None => i += 1,
            }
        }
        matches
    }

    /// Whether the pattern covers exactly code tokens `first..=last`
    pub fn matches_exactly(&self, ts: &TokenStream, first: usize, last: usize) -> bool {
        self.match_at(ts, first).is_some_and(|m| m.last == last)
    }
}

fn capture_name(element: &Element) -> Option<&str> {
    match element {
        Element::Ident(name) | Element::Run(name) => Some(name),
        Element::Token(..) => None,
    }
}

fn is_closer(text: &str) -> bool {
    matches!(text, ")" | "]" | "}")
}

/// Index of the terminator token ending a balanced run that starts at `from`.
///
/// Returns `None` if the run would have to leave the bracket it started in.
fn balanced_run(ts: &TokenStream, from: usize, kind: TokenKind, terminator: &str) -> Option<usize> {
    let mut stack: Vec<&'static str> = Vec::new();
    for j in from..ts.len() {
        let text = ts.text(j);
        // A stray `<` mis-read as generic must not hide a closing terminator
        let only_angles = stack.iter().all(|c| *c == ">");
        if ts.kind(j) == kind
            && text == terminator
            && (stack.is_empty() || (only_angles && is_closer(terminator)))
        {
            return Some(j);
        }
        if ts.kind(j) != TokenKind::Punct {
            continue;
        }
        match text {
            "(" => stack.push(")"),
            "[" => stack.push("]"),
            "{" => stack.push("}"),
            "<" if ts.opens_generic(j) => stack.push(">"),
            ">" if stack.last() == Some(&">") => {
                stack.pop();
            }
            ")" | "]" | "}" => {
                while stack.last() == Some(&">") {
                    stack.pop();
                }
                if stack.pop() != Some(text) {
                    return None;
                }
            }
            _ => {}
        }
    }
    None
}

/// Replacement text with `$name` references to pattern captures
#[derive(Debug, Clone)]
pub struct Template {
    parts: Vec<Part>,
}

#[derive(Debug, Clone)]
enum Part {
    Text(String),
    Capture(String),
}

impl Template {
    pub fn parse(template: &str, pattern: &Pattern) -> Result<Self> {
        let mut parts = Vec::new();
        let mut text = String::new();
        let mut chars = template.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            let starts_name = chars
                .peek()
                .is_some_and(|(_, n)| *n == '_' || n.is_alphabetic());
            if c != '$' || !starts_name {
                text.push(c);
                continue;
            }
            let start = i + 1;
            let mut end = start;
            while let Some((j, n)) = chars.peek().copied() {
                if n == '_' || n.is_alphanumeric() {
                    end = j + n.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let name = &template[start..end];
            if !pattern.has_capture(name) {
                return Err(CodemodError::pattern(
                    pattern.as_str(),
                    format!("template `{template}` uses unknown capture `${name}`"),
                ));
            }
            if !text.is_empty() {
                parts.push(Part::Text(std::mem::take(&mut text)));
            }
            parts.push(Part::Capture(name.to_string()));
        }
        if !text.is_empty() {
            parts.push(Part::Text(text));
        }

        Ok(Self { parts })
    }

    pub fn render(&self, source: &str, m: &Match) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Text(text) => out.push_str(text),
                Part::Capture(name) => {
                    if let Some(span) = m.capture(name) {
                        out.push_str(span.slice(source));
                    }
                }
            }
        }
        out
    }

    /// Like [`Template::render`], passing each captured text through `capture` first
    pub fn render_with<F>(&self, source: &str, m: &Match, capture: F) -> Result<String>
    where
        F: Fn(&str) -> Result<String>,
    {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Text(text) => out.push_str(text),
                Part::Capture(name) => {
                    if let Some(span) = m.capture(name) {
                        out.push_str(&capture(span.slice(source))?);
                    }
                }
            }
        }
        Ok(out)
    }
}
