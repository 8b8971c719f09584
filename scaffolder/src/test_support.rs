//! Test-only helpers: scripted runners and responders.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow, bail};

use crate::core::classifier::{CommandFailure, CommandResult};
use crate::core::types::Command;
use crate::io::responder::PromptResponder;
use crate::io::runner::CommandRunner;

/// Responder that answers prompts from a fixed queue and records what it saw.
#[derive(Debug, Default)]
pub struct ScriptedResponder {
    answers: VecDeque<String>,
    prompts: Vec<String>,
}

impl ScriptedResponder {
    pub fn new(answers: Vec<String>) -> Self {
        Self {
            answers: answers.into(),
            prompts: Vec::new(),
        }
    }

    /// Prompt chunks received so far, in order.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn assert_drained(&self) -> Result<()> {
        if self.answers.is_empty() {
            Ok(())
        } else {
            Err(anyhow!("{} scripted answers left", self.answers.len()))
        }
    }
}

impl PromptResponder for ScriptedResponder {
    fn respond(&mut self, prompt: &str) -> Result<String> {
        self.prompts.push(prompt.to_string());
        match self.answers.pop_front() {
            Some(answer) => Ok(answer),
            None => bail!("no scripted answer for prompt {prompt:?}"),
        }
    }
}

/// A command observed by [`ScriptedRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRun {
    pub command: Command,
    pub workdir: Option<PathBuf>,
}

/// Runner that records every command and succeeds unless told otherwise.
///
/// Failures are keyed by the command's display form (`"git push"`), so tests
/// can fail one specific command anywhere in a plan.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    failing: Vec<String>,
    runs: Vec<RecordedRun>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every command whose display form equals `command` fail.
    pub fn fail_on(mut self, command: &str) -> Self {
        self.failing.push(command.to_string());
        self
    }

    pub fn runs(&self) -> &[RecordedRun] {
        &self.runs
    }

    /// Display forms of the recorded commands, in order.
    pub fn commands(&self) -> Vec<String> {
        self.runs.iter().map(|run| run.command.to_string()).collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&mut self, command: &Command, workdir: Option<&Path>) -> CommandResult {
        self.runs.push(RecordedRun {
            command: command.clone(),
            workdir: workdir.map(Path::to_path_buf),
        });
        let display = command.to_string();
        if self.failing.contains(&display) {
            return Err(CommandFailure::ExitStatus {
                command: display,
                code: Some(1),
            });
        }
        Ok(())
    }
}
