use std::io::Write;
use std::path::Path;

use atomicwrites::{AtomicFile, OverwriteBehavior};

use crate::error::{CodemodError, Result};

/// Persist `updated` to `path` unless it equals `original`.
///
/// Returns whether the file was written. The write goes through a temporary
/// file and a rename, so a crash never leaves a truncated source file behind.
pub fn write_if_changed(path: &Path, original: &str, updated: &str) -> Result<bool> {
    if original == updated {
        return Ok(false);
    }

    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| {
            f.write_all(updated.as_bytes())?;
            f.flush()
        })
        .map_err(|err| CodemodError::Write {
            path: path.to_path_buf(),
            source: match err {
                atomicwrites::Error::Internal(e) | atomicwrites::Error::User(e) => e,
            },
        })?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_skips_identical_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.rs");
        fs::write(&path, "fn f() {}\n").unwrap();

        assert!(!write_if_changed(&path, "fn f() {}\n", "fn f() {}\n").unwrap());
    }

    #[test]
    fn test_writes_changed_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.rs");
        fs::write(&path, "type T = ExprId;\n").unwrap();

        assert!(write_if_changed(&path, "type T = ExprId;\n", "type T = Expr;\n").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "type T = Expr;\n");
    }

    #[test]
    fn test_write_error_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("lib.rs");
        let err = write_if_changed(&path, "a", "b").unwrap_err();
        assert!(matches!(err, CodemodError::Write { path: p, .. } if p == path));
    }
}
