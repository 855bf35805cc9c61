//! Code generator and type checker entry points take node references
//! instead of pool handles.

use crate::discover::FileFilter;
use crate::error::Result;
use crate::pass::Pass;
use crate::rule::{Guard, Guarded, RenameIdentMatching, Rewrite, StripListItem};

pub(super) const NAME: &str = "gen-signatures";

/// Parameters rewritten to borrow the node, as `(old name, new name, node type)`
const NODE_PARAMS: &[(&str, &str, &str)] = &[
    ("left", "left", "Expr"),
    ("right", "right", "Expr"),
    ("operand", "operand", "Expr"),
    ("condition", "condition", "Expr"),
    ("true_expr", "true_expr", "Expr"),
    ("false_expr", "false_expr", "Expr"),
    ("value", "value", "Expr"),
    ("expr", "expr", "Expr"),
    ("expr_id", "expr", "Expr"),
    ("stmt", "stmt", "Stmt"),
    ("stmt_id", "stmt", "Stmt"),
    ("body", "body", "Stmt"),
    ("then_stmt", "then_stmt", "Stmt"),
];

/// Whole-parameter rewrites that do not follow the `name: &Node` shape
const SHAPED_PARAMS: &[(&str, &str)] = &[
    ("else_stmt: Option<StmtId>", "else_stmt: Option<&Stmt>"),
    ("else_stmt: Option<Stmt>", "else_stmt: Option<&Stmt>"),
    ("init: &Option<StmtId>", "init: Option<&Stmt>"),
    ("init: &Option<Stmt>", "init: Option<&Stmt>"),
    ("args: &Vec<ExprId>", "args: &Vec<Expr>"),
    ("args: &[ExprId]", "args: &[Expr]"),
];

pub(super) fn pass() -> Result<Pass> {
    let mut pass = Pass::new(NAME, FileFilter::Suffixes(&["_gen.rs", "_types.rs"]))
        .rule(StripListItem::new(&["pool: &AstPool"])?);

    // Handles are matched both as written and after `owned-ast` renamed them
    for (from, to, node) in NODE_PARAMS {
        for ty in [format!("{node}Id"), node.to_string()] {
            pass = pass.rule(
                Rewrite::new(&format!("{from}: {ty}"), &format!("{to}: &{node}"))?.in_paren_lists(),
            );
        }
    }
    for (pattern, template) in SHAPED_PARAMS {
        pass = pass.rule(Rewrite::new(pattern, template)?.in_paren_lists());
    }

    Ok(pass
        .rule(RenameIdentMatching::new(r"^gen_(\w+)_id$", "gen_$1")?)
        .rule(StripListItem::new(&["pool"])?.owned_by("^gen_")?)
        .rule(Guarded::new(
            Guard::Unused("AstPool".to_string()),
            Rewrite::new("pool.expr($node..)", "$node")?,
        ))
        .rule(Guarded::new(
            Guard::Unused("AstPool".to_string()),
            Rewrite::new("pool.stmt($node..)", "$node")?,
        )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrate(content: &str) -> String {
        pass().unwrap().transform(content).unwrap().content
    }

    #[test]
    fn test_gen_function_signature() {
        assert_eq!(
            migrate("fn gen_add_id(&mut self, pool: &AstPool, left: ExprId, right: ExprId)"),
            "fn gen_add(&mut self, left: &Expr, right: &Expr)"
        );
    }

    #[test]
    fn test_gen_call_sites() {
        assert_eq!(
            migrate("self.gen_expr_id(pool, left)?;"),
            "self.gen_expr(left)?;"
        );
        assert_eq!(
            migrate("self.gen_stmt_id(pool, body);\nself.emit(pool, x);"),
            "self.gen_stmt(body);\nself.emit(pool, x);"
        );
    }

    #[test]
    fn test_matches_already_renamed_handles() {
        assert_eq!(
            migrate("fn check_if(&mut self, condition: Expr, then_stmt: Stmt, else_stmt: Option<Stmt>)"),
            "fn check_if(&mut self, condition: &Expr, then_stmt: &Stmt, else_stmt: Option<&Stmt>)"
        );
        assert_eq!(
            migrate("fn check_call(&mut self, expr_id: ExprId, args: &[ExprId], init: &Option<StmtId>)"),
            "fn check_call(&mut self, expr: &Expr, args: &[Expr], init: Option<&Stmt>)"
        );
    }

    #[test]
    fn test_struct_fields_untouched() {
        let content = "struct Frame {\n    left: Expr,\n    body: Stmt,\n}\n";
        assert_eq!(migrate(content), content);
    }

    #[test]
    fn test_pool_dereferences_once_pool_is_gone() {
        let content = "\
fn gen_neg(&mut self, pool: &AstPool, operand: ExprId) {
    let ty = pool.expr(operand).ty;
    self.gen_expr_id(pool, operand);
}
";
        insta::assert_snapshot!(migrate(content), @r"
        fn gen_neg(&mut self, operand: &Expr) {
            let ty = operand.ty;
            self.gen_expr(operand);
        }
        ");
    }

    #[test]
    fn test_pool_dereferences_kept_while_pool_is_used() {
        let content = "fn lookup(pools: &[AstPool], i: usize) { let e = pool.expr(i); }\n";
        assert_eq!(migrate(content), content);
    }

    #[test]
    fn test_rerun_changes_nothing() {
        let once = migrate(
            "fn gen_if_id(&mut self, pool: &AstPool, condition: ExprId, then_stmt: StmtId, else_stmt: Option<StmtId>) {\n    self.gen_stmt_id(pool, then_stmt);\n}\n",
        );
        assert_eq!(migrate(&once), once);
    }
}
