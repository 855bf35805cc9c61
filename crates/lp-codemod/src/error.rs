use std::path::PathBuf;

use lp_codemod_lex::PatchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodemodError {
    #[error("source root not found: {}", root.display())]
    RootNotFound { root: PathBuf },

    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk source tree")]
    Walk(#[from] ignore::Error),

    #[error("invalid pattern `{pattern}`: {reason}")]
    Pattern { pattern: String, reason: String },

    #[error(transparent)]
    Regex(#[from] regex::Error),

    #[error(transparent)]
    Patch(#[from] PatchError),
}

impl CodemodError {
    pub(crate) fn pattern(pattern: &str, reason: impl Into<String>) -> Self {
        Self::Pattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = CodemodError> = std::result::Result<T, E>;
