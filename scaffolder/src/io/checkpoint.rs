//! Checkpoint storage for the highest completed step.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

/// Plain-text file holding a single decimal step number (`script_status.txt`).
///
/// A missing file means no step has completed yet. There is exactly one
/// writer, so no locking is done.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted step, or 0 if no checkpoint exists.
    pub fn read(&self) -> Result<u32> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no checkpoint, starting at 0");
                return Ok(0);
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("read checkpoint {}", self.path.display()));
            }
        };
        let step = contents
            .trim()
            .parse::<u32>()
            .with_context(|| format!("parse checkpoint {}", self.path.display()))?;
        debug!(path = %self.path.display(), step, "checkpoint loaded");
        Ok(step)
    }

    /// Atomically overwrite the checkpoint (temp file + rename).
    pub fn write(&self, step: u32) -> Result<()> {
        debug!(path = %self.path.display(), step, "writing checkpoint");
        write_atomic(&self.path, &format!("{step}\n"))
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp checkpoint {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace checkpoint {}", path.display()))?;
    Ok(())
}
