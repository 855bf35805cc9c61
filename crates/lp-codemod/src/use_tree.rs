//! `use` declarations: locating them, reading their trees, and normalizing
//! grouped import lists.
//!
//! Statements and trees come from `ra_ap_syntax`'s `ast::Use` and
//! `ast::UseTree`. They are mapped onto code-token indices so edits go
//! through the same [`PatchSet`] as every other rule.

use std::collections::HashSet;

use lp_codemod_lex::{PatchSet, Span, TokenStream, whole_lines};
use ra_ap_syntax::ast::{self, HasVisibility};
use ra_ap_syntax::{AstNode, Edition, SourceFile, TextRange};

use crate::error::Result;
use crate::list::{ListItem, removal_spans};
use crate::rule::Codemod;

/// One `use ...;` declaration
#[derive(Debug, Clone)]
pub struct UseStatement {
    /// From the visibility (if any) through the closing `;`
    pub span: Span,
    /// Code token of the `pub` or `use` starting the statement
    pub first: usize,
    /// Code token of the `;`
    pub last: usize,
    /// Bracket depth of the statement; 0 for file-level imports
    pub depth: usize,
    pub tree: UseTree,
}

impl UseStatement {
    /// Whether `name` is brought into scope by this statement
    pub fn imports_name(&self, ts: &TokenStream, name: &str) -> bool {
        self.tree.imports_name(ts, name)
    }
}

#[derive(Debug, Clone)]
pub struct UseTree {
    /// Inclusive code token range
    pub first: usize,
    pub last: usize,
    pub kind: UseKind,
}

#[derive(Debug, Clone)]
pub enum UseKind {
    /// `path::Name` or `path::Name as Alias`; `name` is the last segment's token
    Name {
        name: usize,
        alias: Option<usize>,
        single_segment: bool,
    },
    /// `path::*`
    Glob,
    /// `path::{...}`; `open` is the `{` token
    Group { open: usize, items: Vec<UseTree> },
}

impl UseTree {
    fn imports_name(&self, ts: &TokenStream, name: &str) -> bool {
        match &self.kind {
            UseKind::Name { name: leaf, alias, .. } => {
                let bound = alias.unwrap_or(*leaf);
                ts.text(bound) == name
            }
            UseKind::Glob => false,
            UseKind::Group { items, .. } => items.iter().any(|item| item.imports_name(ts, name)),
        }
    }

    fn as_list_item(&self) -> ListItem {
        ListItem {
            first: self.first,
            last: self.last,
        }
    }
}

/// Find every `use` declaration in the stream, nested ones included
pub fn use_statements(ts: &TokenStream) -> Vec<UseStatement> {
    let file = SourceFile::parse(ts.source(), Edition::Edition2021).tree();
    file.syntax()
        .descendants()
        .filter_map(ast::Use::cast)
        .filter_map(|item| use_statement(ts, &item))
        .collect()
}

/// Whether `ident` occurs as a code identifier outside all of `statements`
pub fn mentions_outside_imports(
    ts: &TokenStream,
    statements: &[UseStatement],
    ident: &str,
) -> bool {
    (0..ts.len()).any(|i| {
        ts.is_ident(i, ident) && !statements.iter().any(|s| s.first <= i && i <= s.last)
    })
}

fn use_statement(ts: &TokenStream, item: &ast::Use) -> Option<UseStatement> {
    let use_token = item.use_token()?;
    let semicolon = item.semicolon_token()?;
    let start = match item.visibility() {
        Some(vis) => vis.syntax().text_range().start(),
        None => use_token.text_range().start(),
    };
    let span = Span::new(start.into(), semicolon.text_range().end().into());
    let (first, last) = code_tokens(ts, span)?;
    let tree = use_tree(ts, &item.use_tree()?)?;
    Some(UseStatement {
        span,
        first,
        last,
        depth: ts.depth(first),
        tree,
    })
}

fn use_tree(ts: &TokenStream, tree: &ast::UseTree) -> Option<UseTree> {
    let (first, last) = code_tokens(ts, to_span(tree.syntax().text_range()))?;

    let kind = if let Some(list) = tree.use_tree_list() {
        let open = ts.index_at(to_span(list.l_curly_token()?.text_range()).start);
        ts.partner(open)?;
        let items = list
            .use_trees()
            .map(|item| use_tree(ts, &item))
            .collect::<Option<Vec<_>>>()?;
        UseKind::Group { open, items }
    } else if tree.star_token().is_some() {
        UseKind::Glob
    } else {
        let path = tree.path()?;
        let (_, name) = code_tokens(ts, to_span(path.syntax().text_range()))?;
        let alias = match tree.rename() {
            Some(rename) => Some(code_tokens(ts, to_span(rename.syntax().text_range()))?.1),
            None => None,
        };
        UseKind::Name {
            name,
            alias,
            single_segment: path.qualifier().is_none() && !ts.is_punct(first, "::"),
        }
    };

    Some(UseTree { first, last, kind })
}

/// First and last code token inside `span`
fn code_tokens(ts: &TokenStream, span: Span) -> Option<(usize, usize)> {
    let first = ts.index_at(span.start);
    let end = ts.index_at(span.end);
    (first < end).then(|| (first, end - 1))
}

fn to_span(range: TextRange) -> Span {
    Span::new(range.start().into(), range.end().into())
}

/// Normalize import lists: drop obsolete names and rename others.
///
/// A name from `drop` is only removed once nothing outside the imports still
/// refers to it. A leaf naming the same item as an earlier sibling, once
/// renamed, is removed. Groups left empty disappear, and so do statements left empty.
pub struct UseListCleanup {
    name: String,
    drop: Vec<String>,
    rename: Vec<(String, String)>,
}

enum Outcome {
    Keep(PatchSet),
    Remove,
}

impl UseListCleanup {
    pub fn new(drop: &[&str], rename: &[(&str, &str)]) -> Self {
        Self {
            name: format!("clean use lists (drop {})", drop.join(", ")),
            drop: drop.iter().map(|s| s.to_string()).collect(),
            rename: rename
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }

    fn renamed(&self, name: &str) -> Option<&str> {
        self.rename
            .iter()
            .find(|(from, _)| from == name)
            .map(|(_, to)| to.as_str())
    }

    fn clean(&self, ts: &TokenStream, tree: &UseTree, droppable: &HashSet<&str>) -> Outcome {
        match &tree.kind {
            UseKind::Glob => Outcome::Keep(PatchSet::new()),
            UseKind::Name { name, alias, .. } => {
                let text = ts.text(*name);
                if alias.is_none() && droppable.contains(text) {
                    return Outcome::Remove;
                }
                let mut patches = PatchSet::new();
                if let Some(to) = self.renamed(text) {
                    patches.replace(ts.span(*name), to);
                }
                Outcome::Keep(patches)
            }
            UseKind::Group { open, items } => {
                if items.is_empty() {
                    return Outcome::Keep(PatchSet::new());
                }

                let mut seen: HashSet<&str> = HashSet::new();
                let mut patches = PatchSet::new();
                let mut remove = vec![false; items.len()];
                for (k, item) in items.iter().enumerate() {
                    let leaf = simple_leaf(ts, item).filter(|leaf| !droppable.contains(leaf));
                    if let Some(leaf) = leaf {
                        if !seen.insert(self.renamed(leaf).unwrap_or(leaf)) {
                            remove[k] = true;
                            continue;
                        }
                    }
                    match self.clean(ts, item, droppable) {
                        Outcome::Keep(p) => patches.extend(p),
                        Outcome::Remove => remove[k] = true,
                    }
                }

                if remove.iter().all(|r| *r) {
                    return Outcome::Remove;
                }
                let list: Vec<ListItem> = items.iter().map(UseTree::as_list_item).collect();
                for span in removal_spans(ts, *open, &list, &remove) {
                    patches.delete(span);
                }
                Outcome::Keep(patches)
            }
        }
    }
}

/// The bare name of a one-segment, un-aliased leaf such as `Expr` in `{Expr, Stmt}`
fn simple_leaf<'a>(ts: &TokenStream<'a>, tree: &UseTree) -> Option<&'a str> {
    match tree.kind {
        UseKind::Name {
            name,
            alias: None,
            single_segment: true,
        } => Some(ts.text(name)),
        _ => None,
    }
}

impl Codemod for UseListCleanup {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, content: &str) -> Result<Option<String>> {
        let ts = TokenStream::new(content);
        let statements = use_statements(&ts);
        let droppable: HashSet<&str> = self
            .drop
            .iter()
            .map(String::as_str)
            .filter(|name| !mentions_outside_imports(&ts, &statements, name))
            .collect();

        let mut patches = PatchSet::new();
        for statement in &statements {
            match self.clean(&ts, &statement.tree, &droppable) {
                Outcome::Keep(p) => patches.extend(p),
                Outcome::Remove => {
                    log::debug!("Removing emptied import `{}`", statement.span.slice(content));
                    patches.delete(whole_lines(content, statement.span));
                }
            }
        }

        if patches.is_empty() {
            return Ok(None);
        }
        let updated = patches.apply(content)?;
        Ok((updated != content).then_some(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleanup(content: &str) -> String {
        UseListCleanup::new(&["AstPool"], &[("ExprId", "Expr"), ("StmtId", "Stmt")])
            .apply(content)
            .unwrap()
            .unwrap_or_else(|| content.to_string())
    }

    #[test]
    fn test_finds_statements() {
        let src = "use a::b;\npub use c::{d, e as f};\npub(crate) use g::*;\nfn x() { use h::i; }";
        let ts = TokenStream::new(src);
        let statements = use_statements(&ts);
        let texts: Vec<&str> = statements.iter().map(|s| s.span.slice(src)).collect();
        assert_eq!(
            texts,
            vec!["use a::b;", "pub use c::{d, e as f};", "pub(crate) use g::*;", "use h::i;"]
        );
        assert_eq!(statements[3].depth, 1);
        assert!(statements[1].imports_name(&ts, "f"));
        assert!(!statements[1].imports_name(&ts, "e"));
    }

    #[test]
    fn test_normalizes_grouped_import() {
        assert_eq!(
            cleanup("use crate::compiler::ast::{AstPool, ExprId, Stmt};\n"),
            "use crate::compiler::ast::{Expr, Stmt};\n"
        );
    }

    #[test]
    fn test_drop_positions() {
        assert_eq!(cleanup("use a::{Expr, AstPool};"), "use a::{Expr};");
        assert_eq!(cleanup("use a::{Expr, AstPool, Stmt};"), "use a::{Expr, Stmt};");
        assert_eq!(cleanup("use a::{Expr, AstPool,};"), "use a::{Expr,};");
        assert_eq!(
            cleanup("use a::{\n    AstPool,\n    Expr,\n};"),
            "use a::{\n    Expr,\n};"
        );
    }

    #[test]
    fn test_removes_emptied_statements() {
        assert_eq!(cleanup("use a::AstPool;\nuse b::C;\n"), "use b::C;\n");
        assert_eq!(cleanup("use a::{AstPool};\nfn f() {}\n"), "fn f() {}\n");
        assert_eq!(
            cleanup("use crate::{ast::{AstPool}, codegen};\n"),
            "use crate::{codegen};\n"
        );
    }

    #[test]
    fn test_renamed_duplicates_are_removed() {
        assert_eq!(cleanup("use a::{Expr, ExprId};"), "use a::{Expr};");
        assert_eq!(cleanup("use a::{ExprId, Expr};"), "use a::{Expr};");
        assert_eq!(
            cleanup("use a::{AstPool, Expr, ExprId, Stmt, StmtId};"),
            "use a::{Expr, Stmt};"
        );
    }

    #[test]
    fn test_duplicate_siblings_are_removed() {
        assert_eq!(
            cleanup("use crate::compiler::ast::{AstPool, Expr, Expr, Stmt};\n"),
            "use crate::compiler::ast::{Expr, Stmt};\n"
        );
        assert_eq!(cleanup("use a::{Stmt, StmtId, Stmt};"), "use a::{Stmt};");
    }

    #[test]
    fn test_ignores_use_in_strings_and_comments() {
        let src = "// use a::AstPool;\nlet s = \"use b::AstPool;\";\nuse c::d;\n";
        let ts = TokenStream::new(src);
        let statements = use_statements(&ts);
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].span.slice(src), "use c::d;");
    }

    #[test]
    fn test_attributes_are_outside_the_statement() {
        let src = "#[cfg(test)]\n/// doc\npub(super) use a::{b as _, self};\n";
        let ts = TokenStream::new(src);
        let statements = use_statements(&ts);
        assert_eq!(statements[0].span.slice(src), "pub(super) use a::{b as _, self};");
        assert_eq!(ts.text(statements[0].first), "pub");
        assert_eq!(ts.text(statements[0].last), ";");
        let UseKind::Group { open, items } = &statements[0].tree.kind else {
            panic!("expected a group");
        };
        assert_eq!(ts.text(*open), "{");
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0].kind, UseKind::Name { alias: Some(_), .. }));
        assert!(statements[0].imports_name(&ts, "self"));
    }

    #[test]
    fn test_pool_still_in_use_is_kept() {
        let content = "use a::{AstPool, ExprId};\nfn f(pool: &AstPool) {}\n";
        assert_eq!(
            cleanup(content),
            "use a::{AstPool, Expr};\nfn f(pool: &AstPool) {}\n"
        );
    }

    #[test]
    fn test_aliases_and_paths_are_left_alone() {
        let content = "use a::{AstPool as Pool, b::AstPoolExt};\nfn f(p: Pool) {}\n";
        assert_eq!(cleanup(content), content);
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let once =
            cleanup("use crate::ast::{AstPool, ExprId, StmtId};\nuse crate::ast::AstPool;\n");
        assert_eq!(once, "use crate::ast::{Expr, Stmt};\n");
        assert_eq!(cleanup(&once), once);
    }
}
