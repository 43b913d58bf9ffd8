//! Git backed [`WorkTree`].

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Result, ServeError};
use crate::provider::WorkTree;

/// The git working tree containing `dir`.
#[derive(Debug, Clone)]
pub struct GitWorkTree {
    dir: PathBuf,
}

impl GitWorkTree {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        GitWorkTree { dir: dir.into() }
    }

    /// Work tree for the process's current directory.
    pub fn current() -> Result<Self> {
        let dir = std::env::current_dir()
            .map_err(|e| ServeError::query("getcwd", e.to_string()))?;
        Ok(GitWorkTree::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        let command = format!("git {}", args.join(" "));
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.dir)
            .output()
            .map_err(|e| ServeError::query(&command, format!("failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ServeError::query(&command, stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl WorkTree for GitWorkTree {
    fn toplevel(&self) -> Result<PathBuf> {
        let root = self.git(&["rev-parse", "--show-toplevel"])?;
        if root.is_empty() {
            return Err(ServeError::query(
                "git rev-parse --show-toplevel",
                "returned empty output",
            ));
        }
        Ok(PathBuf::from(root))
    }

    fn current_branch(&self) -> Result<String> {
        self.git(&["branch", "--show-current"])
    }
}
