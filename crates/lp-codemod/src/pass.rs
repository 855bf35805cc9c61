use std::fmt;

use crate::discover::FileFilter;
use crate::error::Result;
use crate::imports::{ImportDirective, Reconciled};
use crate::rule::Codemod;

/// An import directive that wanted to act but could not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub statement: String,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`: {}", self.statement, self.message)
    }
}

/// Result of running a pass over one file's text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    pub content: String,
    pub changed: bool,
    pub warnings: Vec<Warning>,
}

/// An ordered list of rules plus import directives, applied to every file
/// selected by `filter`.
pub struct Pass {
    name: &'static str,
    filter: FileFilter,
    rules: Vec<Box<dyn Codemod>>,
    imports: Vec<ImportDirective>,
}

impl Pass {
    pub fn new(name: &'static str, filter: FileFilter) -> Self {
        Self {
            name,
            filter,
            rules: Vec::new(),
            imports: Vec::new(),
        }
    }

    pub fn rule(mut self, rule: impl Codemod + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn import(mut self, directive: ImportDirective) -> Self {
        self.imports.push(directive);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn filter(&self) -> &FileFilter {
        &self.filter
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn Codemod> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Apply every rule in order, each to the output of the previous one,
    /// then reconcile imports against the result.
    pub fn transform(&self, original: &str) -> Result<TransformResult> {
        let mut content = original.to_string();
        let mut warnings = Vec::new();

        for rule in &self.rules {
            if let Some(updated) = rule.apply(&content)? {
                log::debug!("[{}] applied {}", self.name, rule.name());
                content = updated;
            }
        }

        for directive in &self.imports {
            match directive.reconcile(&content)? {
                Reconciled::Unchanged => {}
                Reconciled::Changed(updated) => {
                    log::debug!("[{}] reconciled `{}`", self.name, directive.statement());
                    content = updated;
                }
                Reconciled::Unplaceable => warnings.push(Warning {
                    statement: directive.statement().to_string(),
                    message: "needed, but there is no anchor or top-level `use` to place it next to"
                        .to_string(),
                }),
            }
        }

        Ok(TransformResult {
            changed: content != original,
            content,
            warnings,
        })
    }
}

impl fmt::Debug for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pass")
            .field("name", &self.name)
            .field("filter", &self.filter)
            .field("rules", &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>())
            .field("imports", &self.imports.len())
            .finish()
    }
}
