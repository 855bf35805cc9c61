//! A lossless token view of Rust source text, plus span-based patching.
//!
//! Codemods walk a [`TokenStream`] whose tokens concatenate back to the exact
//! input, so anything they leave alone is preserved byte for byte:
//!
//! - [`tokenize`] - the leaves of the `ra_ap_syntax` tree as identifiers,
//!   punctuation, literals, comments and whitespace
//! - [`TokenStream`] - the non-trivia view with bracket pairing
//! - [`PatchSet`] - collect span replacements and apply them in one pass

mod lexer;
mod patch;
mod stream;

pub use lexer::{Token, TokenKind, tokenize};
pub use patch::{Patch, PatchError, PatchSet};
pub use stream::TokenStream;

/// Byte span in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `offset`, used for insertions
    pub fn empty(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// Byte offset of the first character of the line containing `offset`.
pub fn line_start(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map_or(0, |i| i + 1)
}

/// Byte offset of the newline ending the line containing `offset`
/// (or `source.len()` on the last line).
pub fn line_end(source: &str, offset: usize) -> usize {
    source[offset..]
        .find('\n')
        .map_or(source.len(), |i| offset + i)
}

/// Leading whitespace of the line containing `offset`.
pub fn indentation(source: &str, offset: usize) -> &str {
    let start = line_start(source, offset);
    let line = &source[start..line_end(source, start)];
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}

/// Widen `span` to whole lines (including the trailing newline) when nothing
/// but whitespace shares those lines with it. Otherwise `span` is returned as is.
pub fn whole_lines(source: &str, span: Span) -> Span {
    let start = line_start(source, span.start);
    let end = line_end(source, span.end);
    let before = &source[start..span.start];
    let after = &source[span.end..end];
    if before.trim().is_empty() && after.trim().is_empty() {
        Span::new(start, (end + 1).min(source.len()))
    } else {
        span
    }
}
