use crate::Span;

/// A single replacement of a byte span in source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Byte span to replace; empty for a pure insertion
    pub span: Span,
    pub new_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    #[error("patches overlap: {first:?} and {second:?}")]
    Overlap { first: Span, second: Span },
    #[error("patch {span:?} is outside of the {len}-byte source")]
    OutOfBounds { span: Span, len: usize },
}

/// A collection of patches applied to source text in a single forward pass.
///
/// Insertions at the same offset keep the order in which they were added.
#[derive(Debug, Default, Clone)]
pub struct PatchSet {
    patches: Vec<Patch>,
}

impl PatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, mut other: PatchSet) {
        self.patches.append(&mut other.patches);
    }

    pub fn replace(&mut self, span: Span, new_text: impl Into<String>) {
        self.patches.push(Patch {
            span,
            new_text: new_text.into(),
        });
    }

    pub fn delete(&mut self, span: Span) {
        self.replace(span, String::new());
    }

    pub fn insert(&mut self, offset: usize, text: impl Into<String>) {
        self.replace(Span::empty(offset), text);
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    /// Apply all patches to `source`, returning the rewritten text.
    pub fn apply(&self, source: &str) -> Result<String, PatchError> {
        if self.patches.is_empty() {
            return Ok(source.to_string());
        }

        let mut sorted: Vec<&Patch> = self.patches.iter().collect();
        sorted.sort_by_key(|p| (p.span.start, p.span.end));

        let mut out = String::with_capacity(source.len());
        let mut cursor = 0;
        let mut previous: Option<Span> = None;
        for patch in sorted {
            let span = patch.span;
            if span.end > source.len()
                || span.start > span.end
                || !source.is_char_boundary(span.start)
                || !source.is_char_boundary(span.end)
            {
                return Err(PatchError::OutOfBounds {
                    span,
                    len: source.len(),
                });
            }
            if span.start < cursor {
                return Err(PatchError::Overlap {
                    first: previous.unwrap_or_default(),
                    second: span,
                });
            }
            out.push_str(&source[cursor..span.start]);
            out.push_str(&patch.new_text);
            cursor = span.end;
            previous = Some(span);
        }
        out.push_str(&source[cursor..]);

        log::trace!("Applied {} patches", self.patches.len());
        Ok(out)
    }
}
