//! Shared deterministic types for the step sequencer.
//!
//! These types are the contract between the plan, the sequencer, and the
//! command runner. They carry no I/O handles.

use std::fmt;
use std::path::PathBuf;

/// A single unit of work inside a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Change the runner's tracked working directory. No process is spawned.
    ChangeDirectory(PathBuf),
    /// Spawn `argv[0]` with the remaining tokens as arguments.
    Invoke {
        argv: Vec<String>,
        /// Extra environment handed to the child only.
        env: Vec<(String, String)>,
    },
}

impl Command {
    pub fn cd(path: impl Into<PathBuf>) -> Self {
        Self::ChangeDirectory(path.into())
    }

    /// Build an `Invoke` with no extra environment.
    pub fn invoke<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Invoke {
            argv: argv.into_iter().map(Into::into).collect(),
            env: Vec::new(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChangeDirectory(path) => write!(f, "cd {}", path.display()),
            Self::Invoke { argv, .. } => write!(f, "{}", argv.join(" ")),
        }
    }
}

/// An ordered group of commands that either all succeed or leave the
/// checkpoint untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// 1-indexed step number compared against the checkpoint.
    pub number: u32,
    pub name: Option<String>,
    /// Working directory for spawned commands, relative to the tracked directory.
    pub workdir: Option<PathBuf>,
    pub commands: Vec<Command>,
}

impl Step {
    pub fn new(number: u32, commands: Vec<Command>) -> Self {
        Self {
            number,
            name: None,
            workdir: None,
            commands,
        }
    }

    /// Human label used in progress output (`Step 3 (frontend)`).
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("Step {} ({name})", self.number),
            None => format!("Step {}", self.number),
        }
    }
}

/// Result of `execute_step` for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Checkpoint already covered this step; nothing ran.
    Skipped,
    /// Every command succeeded and the checkpoint advanced.
    Completed,
    /// A command failed; the checkpoint is unchanged.
    Failed,
}
