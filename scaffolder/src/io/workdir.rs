//! Tracked working directory shared by the commands of a run.
//!
//! Directory changes never touch the process-wide current directory; spawned
//! children get the tracked directory as their `current_dir` instead.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingDir {
    current: PathBuf,
}

impl WorkingDir {
    pub fn new(start: impl Into<PathBuf>) -> Self {
        Self {
            current: start.into(),
        }
    }

    /// Start from the process's current directory.
    pub fn from_env() -> Result<Self> {
        let cwd = std::env::current_dir().context("read current directory")?;
        Ok(Self::new(cwd))
    }

    pub fn current(&self) -> &Path {
        &self.current
    }

    /// Resolve `path` against the tracked directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.current.join(path)
    }

    /// Move the tracked directory to `path` (absolute or relative).
    ///
    /// The target must exist and be a readable directory. `..` is normalized
    /// by canonicalizing, so symlinks are resolved the way a shell `cd -P` does.
    pub fn change(&mut self, path: &Path) -> Result<()> {
        let target = self.resolve(path);
        let canonical = fs::canonicalize(&target)
            .with_context(|| format!("resolve {}", target.display()))?;
        if !canonical.is_dir() {
            bail!("{} is not a directory", canonical.display());
        }
        fs::read_dir(&canonical).with_context(|| format!("open {}", canonical.display()))?;
        debug!(from = %self.current.display(), to = %canonical.display(), "changed directory");
        self.current = canonical;
        Ok(())
    }

    /// Resolve an optional step override, creating it if absent.
    pub fn prepare(&self, workdir: Option<&Path>) -> Result<PreparedDir> {
        let Some(workdir) = workdir else {
            return Ok(PreparedDir {
                path: self.current.clone(),
                created: false,
            });
        };
        let path = self.resolve(workdir);
        let created = !path.exists();
        if created {
            fs::create_dir_all(&path)
                .with_context(|| format!("create directory {}", path.display()))?;
            debug!(dir = %path.display(), "created step directory");
        }
        Ok(PreparedDir { path, created })
    }
}

/// Spawn directory for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedDir {
    pub path: PathBuf,
    /// `prepare` had to create it.
    pub created: bool,
}
