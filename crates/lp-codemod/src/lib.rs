//! Mechanical migration of Rust sources from pool-indexed AST handles
//! (`ExprId`/`StmtId` into an `AstPool`) to owned `LpBox` nodes.
//!
//! Files are rewritten on a lossless token stream, so literals and comments
//! are never touched and every pass is idempotent.

pub mod discover;
pub mod error;
pub mod imports;
pub mod list;
pub mod migrate;
pub mod pass;
pub mod passes;
pub mod pattern;
pub mod rule;
pub mod use_tree;
pub mod writer;

pub use discover::{FileFilter, discover};
pub use error::{CodemodError, Result};
pub use imports::{ImportDirective, Reconciled};
pub use migrate::{FileOutcome, MigrateConfig, PassReport, run_all, run_pass};
pub use pass::{Pass, TransformResult, Warning};
pub use passes::PassKind;
pub use rule::{
    Codemod, Guard, Guarded, RenameIdent, RenameIdentMatching, Rewrite, StripListItem,
};
pub use use_tree::UseListCleanup;
