//! Reconciling a file's imports with the rewrites applied to it.

use lp_codemod_lex::{
    PatchSet, Span, TokenStream, indentation, line_end, line_start, whole_lines,
};

use crate::error::{CodemodError, Result};
use crate::pattern::Pattern;
use crate::use_tree::{UseStatement, mentions_outside_imports, use_statements};

/// Outcome of reconciling one directive against a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    Unchanged,
    Changed(String),
    /// The import is needed but there is no anchor and no top-level `use`
    /// to place it next to
    Unplaceable,
}

#[derive(Debug, Clone)]
enum DirectiveKind {
    AddIfMissing {
        trigger: String,
        anchor: Option<Pattern>,
    },
    RemoveIfUnused {
        markers: Vec<String>,
    },
}

/// A single import statement a pass keeps in sync with the code
#[derive(Debug, Clone)]
pub struct ImportDirective {
    statement: String,
    pattern: Pattern,
    kind: DirectiveKind,
}

impl ImportDirective {
    /// Insert `statement` when `trigger` is used in code but not imported.
    ///
    /// The new line goes after the first `anchor` match if there is one,
    /// otherwise before the first top-level `use`.
    pub fn add_if_missing(statement: &str, trigger: &str, anchor: Option<&str>) -> Result<Self> {
        Ok(Self {
            statement: statement.to_string(),
            pattern: statement_pattern(statement)?,
            kind: DirectiveKind::AddIfMissing {
                trigger: trigger.to_string(),
                anchor: anchor.map(Pattern::parse).transpose()?,
            },
        })
    }

    /// Delete `statement` once none of `markers` is referenced outside it
    pub fn remove_if_unused(statement: &str, markers: &[&str]) -> Result<Self> {
        Ok(Self {
            statement: statement.to_string(),
            pattern: statement_pattern(statement)?,
            kind: DirectiveKind::RemoveIfUnused {
                markers: markers.iter().map(|m| m.to_string()).collect(),
            },
        })
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn reconcile(&self, content: &str) -> Result<Reconciled> {
        let ts = TokenStream::new(content);
        let present: Vec<Span> = self.pattern.find_all(&ts).into_iter().map(|m| m.span).collect();

        match &self.kind {
            DirectiveKind::AddIfMissing { trigger, anchor } => {
                let statements = use_statements(&ts);
                if !present.is_empty()
                    || !mentions_outside_imports(&ts, &statements, trigger)
                    || statements.iter().any(|s| s.imports_name(&ts, trigger))
                {
                    return Ok(Reconciled::Unchanged);
                }

                let mut patches = PatchSet::new();
                let anchor_span = anchor
                    .as_ref()
                    .and_then(|anchor| anchor.find_all(&ts).into_iter().next())
                    .map(|m| m.span);
                if let Some(span) = anchor_span {
                    let indent = indentation(content, span.start);
                    patches.insert(
                        line_end(content, span.end),
                        format!("\n{indent}{}", self.statement),
                    );
                } else if let Some(first) = statements.iter().find(|s| s.depth == 0) {
                    let start = attributes_start(&ts, first);
                    let indent = indentation(content, start);
                    patches.insert(
                        line_start(content, start),
                        format!("{indent}{}\n", self.statement),
                    );
                } else {
                    log::debug!("No place to insert `{}`", self.statement);
                    return Ok(Reconciled::Unplaceable);
                }
                Ok(Reconciled::Changed(patches.apply(content)?))
            }
            DirectiveKind::RemoveIfUnused { markers } => {
                if present.is_empty() {
                    return Ok(Reconciled::Unchanged);
                }
                let still_used = (0..ts.len()).any(|i| {
                    markers.iter().any(|m| ts.is_ident(i, m))
                        && !present.iter().any(|span| span.contains(ts.span(i).start))
                });
                if still_used {
                    return Ok(Reconciled::Unchanged);
                }

                let mut patches = PatchSet::new();
                for span in present {
                    patches.delete(whole_lines(content, span));
                }
                Ok(Reconciled::Changed(patches.apply(content)?))
            }
        }
    }
}

fn statement_pattern(statement: &str) -> Result<Pattern> {
    let pattern = Pattern::parse(statement)?;
    if !pattern.is_literal() {
        return Err(CodemodError::pattern(statement, "import statements cannot capture"));
    }
    Ok(pattern)
}

/// Offset of the first attribute attached to `statement`, or of the statement itself
fn attributes_start(ts: &TokenStream, statement: &UseStatement) -> usize {
    let mut first = statement.first;
    while first > 0 && ts.is_punct(first - 1, "]") {
        match ts.partner(first - 1) {
            Some(open) if open > 0 && ts.is_punct(open - 1, "#") => first = open - 1,
            _ => break,
        }
    }
    ts.span(first).start
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lpbox() -> ImportDirective {
        ImportDirective::add_if_missing(
            "use lp_pool::LpBox;",
            "LpBox",
            Some("extern crate alloc;"),
        )
        .unwrap()
    }

    fn boxed() -> ImportDirective {
        ImportDirective::remove_if_unused("use alloc::boxed::Box;", &["Box"]).unwrap()
    }

    fn changed(outcome: Reconciled) -> String {
        match outcome {
            Reconciled::Changed(content) => content,
            other => panic!("expected a change, got {other:?}"),
        }
    }

    #[test]
    fn test_adds_after_anchor() {
        let content = "extern crate alloc;\n\nuse crate::ast::Expr;\n\nfn f() -> LpBox<Expr> {}\n";
        assert_eq!(
            changed(lpbox().reconcile(content).unwrap()),
            "extern crate alloc;\nuse lp_pool::LpBox;\n\nuse crate::ast::Expr;\n\nfn f() -> LpBox<Expr> {}\n"
        );
    }

    #[test]
    fn test_adds_before_first_use() {
        let content = "//! Docs\n\nuse crate::ast::Expr;\n\nfn f() -> LpBox<Expr> {}\n";
        assert_eq!(
            changed(lpbox().reconcile(content).unwrap()),
            "//! Docs\n\nuse lp_pool::LpBox;\nuse crate::ast::Expr;\n\nfn f() -> LpBox<Expr> {}\n"
        );
    }

    #[test]
    fn test_adds_above_attributes() {
        let content = "#[cfg(feature = \"std\")]\nuse std::vec::Vec;\nfn f(x: LpBox<u8>) {}\n";
        assert_eq!(
            changed(lpbox().reconcile(content).unwrap()),
            "use lp_pool::LpBox;\n#[cfg(feature = \"std\")]\nuse std::vec::Vec;\nfn f(x: LpBox<u8>) {}\n"
        );
    }

    #[test]
    fn test_add_is_idempotent() {
        let content = "extern crate alloc;\nfn f() -> LpBox<Expr> {}\n";
        let once = changed(lpbox().reconcile(content).unwrap());
        assert_eq!(lpbox().reconcile(&once).unwrap(), Reconciled::Unchanged);
    }

    #[test]
    fn test_add_skips_when_already_imported() {
        let grouped = "use lp_pool::{LpBox, LpVec};\nfn f(x: LpBox<u8>) {}\n";
        assert_eq!(lpbox().reconcile(grouped).unwrap(), Reconciled::Unchanged);
        let unused = "use crate::ast::Expr;\n// LpBox later\n";
        assert_eq!(lpbox().reconcile(unused).unwrap(), Reconciled::Unchanged);
    }

    #[test]
    fn test_add_without_anchor_or_imports() {
        let content = "fn f() -> LpBox<Expr> {}\n";
        assert_eq!(lpbox().reconcile(content).unwrap(), Reconciled::Unplaceable);
    }

    #[test]
    fn test_removes_unused_import() {
        let content = "use alloc::boxed::Box;\nuse lp_pool::LpBox;\n\nfn f() -> LpBox<Expr> {}\n";
        assert_eq!(
            changed(boxed().reconcile(content).unwrap()),
            "use lp_pool::LpBox;\n\nfn f() -> LpBox<Expr> {}\n"
        );
    }

    #[test]
    fn test_keeps_import_in_use() {
        let content = "use alloc::boxed::Box;\nfn f() -> Box<dyn Fn()> {}\n";
        assert_eq!(boxed().reconcile(content).unwrap(), Reconciled::Unchanged);
        let absent = "fn f() {}\n";
        assert_eq!(boxed().reconcile(absent).unwrap(), Reconciled::Unchanged);
    }

    #[test]
    fn test_rejects_capturing_statement() {
        assert!(ImportDirective::remove_if_unused("use $path..;", &["Box"]).is_err());
    }
}
