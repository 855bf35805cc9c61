use crate::discover::FileFilter;
use crate::error::Result;
use crate::pass::Pass;
use crate::use_tree::UseListCleanup;

pub(super) const NAME: &str = "import-cleanup";

pub(super) fn pass() -> Result<Pass> {
    Ok(Pass::new(NAME, FileFilter::Extension("rs"))
        .rule(UseListCleanup::new(
            &["AstPool"],
            &[("ExprId", "Expr"), ("StmtId", "Stmt")],
        )))
}
