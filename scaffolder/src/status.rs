//! Progress report for `scaffolder status`.

use anyhow::Result;

use crate::workspace::Workspace;

/// Completion state of one plan step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepStatus {
    pub number: u32,
    pub label: String,
    pub commands: usize,
    pub done: bool,
}

/// Checkpoint value and per-step completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub checkpoint: u32,
    pub steps: Vec<StepStatus>,
}

impl StatusReport {
    /// First step the next run would execute.
    pub fn next_step(&self) -> Option<&StepStatus> {
        self.steps.iter().find(|step| !step.done)
    }
}

pub fn status_report(workspace: &Workspace) -> Result<StatusReport> {
    let checkpoint = workspace.checkpoint.read()?;
    let steps = workspace
        .steps
        .iter()
        .map(|step| StepStatus {
            number: step.number,
            label: step.label(),
            commands: step.commands.len(),
            done: checkpoint >= step.number,
        })
        .collect();
    Ok(StatusReport { checkpoint, steps })
}
