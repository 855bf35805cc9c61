use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::error::{CodemodError, Result};

/// Which files under the root a pass looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileFilter {
    /// Every file with this extension (without the dot)
    Extension(&'static str),
    /// Files whose name ends with one of these suffixes, e.g. `_gen.rs`
    Suffixes(&'static [&'static str]),
}

impl FileFilter {
    pub fn matches(&self, path: &Path) -> bool {
        match self {
            FileFilter::Extension(ext) => path.extension().is_some_and(|e| e == *ext),
            FileFilter::Suffixes(suffixes) => path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| suffixes.iter().any(|s| name.ends_with(s))),
        }
    }
}

/// Collect every file under `root` accepted by `filter`.
///
/// - Always recursive traversal
/// - Visits hidden, ignored and build directories alike
/// - Returns deterministically sorted paths
pub fn discover(root: &Path, filter: &FileFilter) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(CodemodError::RootNotFound {
            root: root.to_path_buf(),
        });
    }

    let mut builder = WalkBuilder::new(root);
    builder.standard_filters(false);

    let mut files = Vec::new();
    for result in builder.build() {
        let entry = result?;
        let path = entry.path();
        if entry.file_type().is_some_and(|ft| ft.is_file()) && filter.matches(path) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();

    log::debug!("Discovered {} files under {}", files.len(), root.display());
    Ok(files)
}
