//! `ExprId`/`StmtId` handles into an `AstPool` become owned `Expr`/`Stmt`
//! nodes boxed with `LpBox`.

use crate::discover::FileFilter;
use crate::error::Result;
use crate::imports::ImportDirective;
use crate::pass::Pass;
use crate::rule::{RenameIdent, Rewrite, StripListItem};

pub(super) const NAME: &str = "owned-ast";

pub(super) fn pass() -> Result<Pass> {
    let mut pass = Pass::new(NAME, FileFilter::Extension("rs"))
        .rule(RenameIdent::new("ExprId", "Expr"))
        .rule(RenameIdent::new("StmtId", "Stmt"))
        .rule(Rewrite::new("Box<Expr>", "LpBox<Expr>")?)
        .rule(Rewrite::new("Box<Stmt>", "LpBox<Stmt>")?)
        .rule(Rewrite::new("Box::new($args..)", "LpBox::try_new($args)")?)
        .rule(StripListItem::new(&["pool: AstPool", "mut pool: AstPool"])?)
        .rule(Rewrite::new("-> (Expr, AstPool)", "-> Expr")?)
        .rule(Rewrite::new("-> (Stmt, AstPool)", "-> Stmt")?);

    for accessor in ["expr", "expr_mut", "stmt", "stmt_mut"] {
        pass = pass.rule(Rewrite::new(&format!("pool.{accessor}($node..)"), "$node")?);
    }

    Ok(pass
        .rule(Rewrite::new(
            "pool.alloc_expr($kind.., $span..)?",
            "Expr::new($kind, $span)",
        )?)
        .rule(Rewrite::new(
            "pool.alloc_stmt($kind.., $span..)?",
            "Stmt::new($kind, $span)",
        )?)
        .import(ImportDirective::add_if_missing(
            "use lp_pool::LpBox;",
            "LpBox",
            Some("extern crate alloc;"),
        )?)
        .import(ImportDirective::remove_if_unused(
            "use alloc::boxed::Box;",
            &["Box"],
        )?))
}
