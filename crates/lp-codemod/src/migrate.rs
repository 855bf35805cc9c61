use std::fs;
use std::path::PathBuf;

use crate::discover::discover;
use crate::error::{CodemodError, Result};
use crate::pass::{Pass, TransformResult, Warning};
use crate::passes::PassKind;
use crate::writer::write_if_changed;

/// Where to run and whether to touch the disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateConfig {
    pub root: PathBuf,
    pub dry_run: bool,
}

/// One processed file, handed to the caller as soon as it is done
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub original: String,
    pub result: TransformResult,
}

/// Summary of one pass over the tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub pass: &'static str,
    pub scanned: usize,
    /// Files that changed (or would have, in a dry run)
    pub modified: Vec<PathBuf>,
    pub warnings: Vec<(PathBuf, Warning)>,
    pub dry_run: bool,
}

impl PassReport {
    pub fn modified_count(&self) -> usize {
        self.modified.len()
    }
}

/// Run `pass` over every matching file under the configured root.
///
/// Files are read, transformed and written one at a time. An I/O error stops
/// the run; files already written stay written.
pub fn run_pass(
    pass: &Pass,
    config: &MigrateConfig,
    mut on_file: impl FnMut(&FileOutcome),
) -> Result<PassReport> {
    let files = discover(&config.root, pass.filter())?;
    log::debug!("[{}] {} candidate files", pass.name(), files.len());

    let mut report = PassReport {
        pass: pass.name(),
        scanned: files.len(),
        dry_run: config.dry_run,
        ..Default::default()
    };

    for path in files {
        let original = fs::read_to_string(&path).map_err(|source| CodemodError::Read {
            path: path.clone(),
            source,
        })?;
        let result = pass.transform(&original)?;

        if result.changed {
            if config.dry_run {
                log::debug!("[{}] would modify {}", pass.name(), path.display());
            } else {
                write_if_changed(&path, &original, &result.content)?;
            }
            report.modified.push(path.clone());
        }
        report
            .warnings
            .extend(result.warnings.iter().cloned().map(|w| (path.clone(), w)));

        on_file(&FileOutcome {
            path,
            original,
            result,
        });
    }

    Ok(report)
}

/// Run every pass in order, each as a fresh traversal of the tree
pub fn run_all(
    config: &MigrateConfig,
    mut on_file: impl FnMut(&'static str, &FileOutcome),
) -> Result<Vec<PassReport>> {
    let mut reports = Vec::new();
    for kind in PassKind::SEQUENCE {
        let pass = kind.build()?;
        let name = pass.name();
        reports.push(run_pass(&pass, config, |outcome| on_file(name, outcome))?);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover::FileFilter;
    use crate::rule::RenameIdent;

    fn rename_pass() -> Pass {
        Pass::new("rename", FileFilter::Extension("rs")).rule(RenameIdent::new("ExprId", "Expr"))
    }

    #[test]
    fn test_run_pass_writes_changed_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "type A = ExprId;\n").unwrap();
        fs::write(dir.path().join("b.rs"), "type B = u8;\n").unwrap();

        let config = MigrateConfig {
            root: dir.path().to_path_buf(),
            dry_run: false,
        };
        let mut seen = Vec::new();
        let report = run_pass(&rename_pass(), &config, |o| seen.push(o.path.clone())).unwrap();

        assert_eq!(report.scanned, 2);
        assert_eq!(report.modified, vec![dir.path().join("a.rs")]);
        assert_eq!(seen.len(), 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("a.rs")).unwrap(),
            "type A = Expr;\n"
        );
    }

    #[test]
    fn test_dry_run_leaves_files_alone() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "type A = ExprId;\n").unwrap();

        let config = MigrateConfig {
            root: dir.path().to_path_buf(),
            dry_run: true,
        };
        let report = run_pass(&rename_pass(), &config, |_| {}).unwrap();

        assert_eq!(report.modified_count(), 1);
        assert!(report.dry_run);
        assert_eq!(
            fs::read_to_string(dir.path().join("a.rs")).unwrap(),
            "type A = ExprId;\n"
        );
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = MigrateConfig {
            root: dir.path().join("crates/lp-script/src"),
            dry_run: false,
        };
        let err = run_pass(&rename_pass(), &config, |_| {}).unwrap_err();
        assert!(matches!(err, CodemodError::RootNotFound { .. }));
    }
}
