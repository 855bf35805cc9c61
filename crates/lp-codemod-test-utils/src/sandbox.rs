//! Throwaway source trees for codemod tests.
//!
//! Everything lives under an `assert_fs::TempDir` and is cleaned up on drop.
//!
//! ```no_run
//! use lp_codemod_test_utils::sandbox::Sandbox;
//!
//! let mut sb = Sandbox::new();
//! sb.write("src/ast.rs", "pub type Node = ExprId;\n");
//!
//! let output = sb.run("lp-codemod", ["owned-ast", "--root", "src"]);
//! assert!(output.status.success());
//! assert_eq!(sb.read("src/ast.rs"), "pub type Node = Expr;\n");
//! ```

use assert_fs::TempDir;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::SystemTime;

pub struct Sandbox {
    root: TempDir,
    default_cwd: PathBuf,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Sandbox {
    /// Create a new sandbox; all state is under an auto-cleaned TempDir.
    pub fn new() -> Self {
        let root = TempDir::new().expect("create sandbox TempDir");
        let default_cwd = root.path().to_path_buf();
        Self { root, default_cwd }
    }

    /// Absolute path to the sandbox root.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Absolute path of `rel` inside the sandbox.
    pub fn path<P: AsRef<Path>>(&self, rel: P) -> PathBuf {
        self.root_path().join(rel)
    }

    /// Write/overwrite a file relative to the sandbox root.
    pub fn write<P: AsRef<Path>, S: AsRef<[u8]>>(&mut self, rel: P, contents: S) -> &mut Self {
        let p = self.path(rel);
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(p, contents).expect("write file");
        self
    }

    /// Read a file relative to the sandbox root.
    pub fn read<P: AsRef<Path>>(&self, rel: P) -> String {
        fs::read_to_string(self.path(rel)).expect("read file")
    }

    /// Last modification time of a file relative to the sandbox root.
    pub fn modified<P: AsRef<Path>>(&self, rel: P) -> SystemTime {
        fs::metadata(self.path(rel))
            .and_then(|m| m.modified())
            .expect("read file mtime")
    }

    /// Build a `duct::Expression` for a system binary, run from the sandbox root.
    pub fn cmd<S: AsRef<OsStr>, I: IntoIterator>(&self, program: S, args: I) -> duct::Expression
    where
        I::Item: AsRef<OsStr>,
    {
        let args: Vec<_> = args
            .into_iter()
            .map(|arg| arg.as_ref().to_os_string())
            .collect();
        duct::cmd(program.as_ref(), args).dir(&self.default_cwd)
    }

    /// Run a cargo binary from the sandbox root and capture its output.
    /// A non-zero exit status is returned, not raised.
    pub fn run<I>(&self, program: &str, args: I) -> Output
    where
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        let bin = assert_cmd::cargo::cargo_bin(program);
        self.cmd(bin, args)
            .env("NO_COLOR", "1")
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
            .expect("spawn cargo binary")
    }
}
