//! Checkpointed execution of an ordered step plan.
//!
//! A step runs only if the checkpoint is below its number. The checkpoint
//! advances after every command of the step succeeded, so re-running after a
//! failure resumes at the failed step.

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use crate::core::types::{Step, StepOutcome};
use crate::io::checkpoint::CheckpointStore;
use crate::io::runner::CommandRunner;

/// Why `run_plan` stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStop {
    /// Every step was completed or already done.
    Finished,
    /// A step failed; later steps were not attempted.
    Failed { step: u32 },
}

/// Summary of a `run_plan` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Checkpoint value before the first step.
    pub started_at: u32,
    pub skipped: Vec<u32>,
    pub completed: Vec<u32>,
    pub stop: RunStop,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.stop == RunStop::Finished
    }
}

/// Run one step unless the checkpoint already covers it.
///
/// Stops at the first failing command. Checkpoint I/O errors propagate; command
/// failures are reported as [`StepOutcome::Failed`].
#[instrument(skip_all, fields(step = step.number))]
pub fn execute_step<R: CommandRunner + ?Sized>(
    step: &Step,
    checkpoint: &CheckpointStore,
    runner: &mut R,
) -> Result<StepOutcome> {
    let current = checkpoint.read()?;
    if current >= step.number {
        println!("{} already completed. Skipping...", step.label());
        debug!(current, "step covered by checkpoint");
        return Ok(StepOutcome::Skipped);
    }

    println!("Executing {}...", step.label());
    for (index, command) in step.commands.iter().enumerate() {
        debug!(index, command = %command, "running command");
        if runner.run(command, step.workdir.as_deref()).is_err() {
            println!("{} failed.", step.label());
            warn!(index, command = %command, "step failed");
            return Ok(StepOutcome::Failed);
        }
    }

    checkpoint.write(step.number)?;
    info!(commands = step.commands.len(), "step completed");
    Ok(StepOutcome::Completed)
}

/// Run `steps` in order, stopping at the first failed step.
pub fn run_plan<R: CommandRunner + ?Sized>(
    steps: &[Step],
    checkpoint: &CheckpointStore,
    runner: &mut R,
) -> Result<RunOutcome> {
    let started_at = checkpoint.read()?;
    let mut outcome = RunOutcome {
        started_at,
        skipped: Vec::new(),
        completed: Vec::new(),
        stop: RunStop::Finished,
    };

    for step in steps {
        match execute_step(step, checkpoint, runner)? {
            StepOutcome::Skipped => outcome.skipped.push(step.number),
            StepOutcome::Completed => outcome.completed.push(step.number),
            StepOutcome::Failed => {
                outcome.stop = RunStop::Failed { step: step.number };
                break;
            }
        }
    }

    Ok(outcome)
}
