//! The three migration passes, run in this order by `all`.

mod gen_signatures;
mod import_cleanup;
mod owned_ast;

use std::fmt;

use crate::error::Result;
use crate::pass::Pass;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    OwnedAst,
    GenSignatures,
    ImportCleanup,
}

impl PassKind {
    /// Order used when running every pass
    pub const SEQUENCE: [PassKind; 3] = [
        PassKind::OwnedAst,
        PassKind::GenSignatures,
        PassKind::ImportCleanup,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PassKind::OwnedAst => owned_ast::NAME,
            PassKind::GenSignatures => gen_signatures::NAME,
            PassKind::ImportCleanup => import_cleanup::NAME,
        }
    }

    pub fn build(self) -> Result<Pass> {
        match self {
            PassKind::OwnedAst => owned_ast::pass(),
            PassKind::GenSignatures => gen_signatures::pass(),
            PassKind::ImportCleanup => import_cleanup::pass(),
        }
    }
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_passes_build() {
        for kind in PassKind::SEQUENCE {
            let pass = kind.build().unwrap();
            assert_eq!(pass.name(), kind.name());
            assert!(pass.rules().count() > 0);
        }
    }

    #[test]
    fn test_sequence_merges_handle_and_node_imports() {
        let source = "use crate::compiler::ast::{AstPool, ExprId, Expr, Stmt};\n\nfn first(e: ExprId) -> Stmt {\n    todo!()\n}\n";
        let mut content = source.to_string();
        for kind in PassKind::SEQUENCE {
            content = kind.build().unwrap().transform(&content).unwrap().content;
        }
        assert_eq!(
            content,
            "use crate::compiler::ast::{Expr, Stmt};\n\nfn first(e: Expr) -> Stmt {\n    todo!()\n}\n"
        );
    }

    /// Every pass leaves its own output untouched.
    #[test]
    fn test_sequence_is_idempotent() {
        let source = "\
extern crate alloc;

use alloc::boxed::Box;
use crate::compiler::ast::{AstPool, ExprId, ExprKind, StmtId};

pub fn parse_binary(mut pool: AstPool, left: ExprId, right: ExprId) -> Result<(Expr, AstPool), Error> {
    let node = pool.alloc_expr(ExprKind::Add(left, right), span_of(&pool.expr(left).span))?;
    let wrapped: Box<Expr> = Box::new(node);
    Ok((node, pool))
}
";
        let mut content = source.to_string();
        for kind in PassKind::SEQUENCE {
            content = kind.build().unwrap().transform(&content).unwrap().content;
        }
        for kind in PassKind::SEQUENCE {
            let again = kind.build().unwrap().transform(&content).unwrap();
            assert!(!again.changed, "{kind} changed migrated output:\n{}", again.content);
        }
    }
}
