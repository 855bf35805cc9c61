use lp_codemod_lex::{PatchSet, Span, TokenKind, TokenStream};
use regex::Regex;

use crate::error::Result;
use crate::list::{list_items, removal_spans};
use crate::pattern::{Pattern, Template};
use crate::use_tree::{mentions_outside_imports, use_statements};

/// A single rewrite step of a pass.
///
/// `apply` returns `Ok(None)` when the rule does not apply to `content`.
/// Rules are deterministic and hold no state between calls.
pub trait Codemod {
    fn name(&self) -> &str;
    fn apply(&self, content: &str) -> Result<Option<String>>;
}

fn finish(content: &str, patches: PatchSet) -> Result<Option<String>> {
    if patches.is_empty() {
        return Ok(None);
    }
    let updated = patches.apply(content)?;
    Ok((updated != content).then_some(updated))
}

/// Rename every identifier token equal to `from`
pub struct RenameIdent {
    name: String,
    from: String,
    to: String,
}

impl RenameIdent {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            name: format!("rename {from} -> {to}"),
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

impl Codemod for RenameIdent {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, content: &str) -> Result<Option<String>> {
        let ts = TokenStream::new(content);
        let mut patches = PatchSet::new();
        for i in 0..ts.len() {
            if ts.is_ident(i, &self.from) {
                patches.replace(ts.span(i), self.to.as_str());
            }
        }
        finish(content, patches)
    }
}

/// Rename identifier tokens matching a regex, e.g. `^gen_(\w+)_id$` -> `gen_$1`
pub struct RenameIdentMatching {
    name: String,
    regex: Regex,
    replacement: String,
}

impl RenameIdentMatching {
    pub fn new(regex: &str, replacement: &str) -> Result<Self> {
        Ok(Self {
            name: format!("rename /{regex}/ -> {replacement}"),
            regex: Regex::new(regex)?,
            replacement: replacement.to_string(),
        })
    }
}

impl Codemod for RenameIdentMatching {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, content: &str) -> Result<Option<String>> {
        let ts = TokenStream::new(content);
        let mut patches = PatchSet::new();
        for i in 0..ts.len() {
            if ts.kind(i) != TokenKind::Ident {
                continue;
            }
            let text = ts.text(i);
            if self.regex.is_match(text) {
                let renamed = self.regex.replace(text, self.replacement.as_str());
                if renamed != text {
                    patches.replace(ts.span(i), renamed.into_owned());
                }
            }
        }
        finish(content, patches)
    }
}

/// Where a [`Rewrite`] may match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Anywhere,
    /// Only directly inside a `(...)` list: parameters and call arguments
    ParenList,
}

/// Replace every match of a token pattern with a rendered template
pub struct Rewrite {
    name: String,
    pattern: Pattern,
    template: Template,
    scope: Scope,
}

impl Rewrite {
    pub fn new(pattern: &str, template: &str) -> Result<Self> {
        let pattern = Pattern::parse(pattern)?;
        Self::from_pattern(pattern, template)
    }

    pub fn from_pattern(pattern: Pattern, template: &str) -> Result<Self> {
        let template_parsed = Template::parse(template, &pattern)?;
        Ok(Self {
            name: format!("rewrite `{}` -> `{template}`", pattern.as_str()),
            pattern,
            template: template_parsed,
            scope: Scope::Anywhere,
        })
    }

    pub fn in_paren_lists(mut self) -> Self {
        self.scope = Scope::ParenList;
        self
    }
}

impl Codemod for Rewrite {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, content: &str) -> Result<Option<String>> {
        let ts = TokenStream::new(content);
        let mut patches = PatchSet::new();
        for m in self.pattern.find_all(&ts) {
            if self.scope == Scope::ParenList {
                let in_parens = ts
                    .enclosing(m.first)
                    .is_some_and(|open| ts.is_punct(open, "("));
                if !in_parens {
                    continue;
                }
            }
            // Matches nested inside a capture are rewritten too
            let rendered = self.template.render_with(content, &m, |captured| {
                Ok(self.apply(captured)?.unwrap_or_else(|| captured.to_string()))
            })?;
            patches.replace(m.span, rendered);
        }
        finish(content, patches)
    }
}

/// Delete whole items of `(...)` lists that consist of exactly one of the
/// given token sequences, keeping the commas of the remaining items tidy.
///
/// Works for both parameter lists and call arguments. With an owner filter,
/// only lists directly preceded by a matching identifier (the function or
/// method name) are touched.
pub struct StripListItem {
    name: String,
    items: Vec<Pattern>,
    owner: Option<Regex>,
}

impl StripListItem {
    pub fn new(items: &[&str]) -> Result<Self> {
        Ok(Self {
            name: format!("strip list items {}", items.join(" | ")),
            items: items
                .iter()
                .map(|item| Pattern::parse(item))
                .collect::<Result<_>>()?,
            owner: None,
        })
    }

    pub fn owned_by(mut self, regex: &str) -> Result<Self> {
        self.name = format!("{} in /{regex}/ calls", self.name);
        self.owner = Some(Regex::new(regex)?);
        Ok(self)
    }

    fn owner_matches(&self, ts: &TokenStream, open: usize) -> bool {
        match &self.owner {
            None => true,
            Some(regex) => {
                open > 0
                    && ts.kind(open - 1) == TokenKind::Ident
                    && regex.is_match(ts.text(open - 1))
            }
        }
    }
}

impl Codemod for StripListItem {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, content: &str) -> Result<Option<String>> {
        let ts = TokenStream::new(content);
        let mut patches = PatchSet::new();
        let mut removed: Vec<Span> = Vec::new();

        for open in 0..ts.len() {
            if !ts.is_punct(open, "(") || !self.owner_matches(&ts, open) {
                continue;
            }
            let start = ts.span(open).start;
            if removed.iter().any(|span| span.contains(start)) {
                continue;
            }

            let items = list_items(&ts, open);
            let remove: Vec<bool> = items
                .iter()
                .map(|item| {
                    self.items
                        .iter()
                        .any(|p| p.matches_exactly(&ts, item.first, item.last))
                })
                .collect();
            if !remove.contains(&true) {
                continue;
            }
            for span in removal_spans(&ts, open, &items, &remove) {
                patches.delete(span);
                removed.push(span);
            }
        }
        finish(content, patches)
    }
}

/// A condition over the whole file as transformed so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// The identifier no longer occurs in code outside `use` statements
    Unused(String),
}

impl Guard {
    pub fn holds(&self, content: &str) -> bool {
        let ts = TokenStream::new(content);
        let statements = use_statements(&ts);
        match self {
            Guard::Unused(ident) => !mentions_outside_imports(&ts, &statements, ident),
        }
    }
}

/// Run `inner` only while `guard` holds
pub struct Guarded {
    name: String,
    guard: Guard,
    inner: Box<dyn Codemod>,
}

impl Guarded {
    pub fn new(guard: Guard, inner: impl Codemod + 'static) -> Self {
        Self {
            name: format!("{} when {guard:?}", inner.name()),
            guard,
            inner: Box::new(inner),
        }
    }
}

impl Codemod for Guarded {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, content: &str) -> Result<Option<String>> {
        if !self.guard.holds(content) {
            log::trace!("{}: guard not satisfied", self.name);
            return Ok(None);
        }
        self.inner.apply(content)
    }
}
