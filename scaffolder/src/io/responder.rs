//! Sources of answers for prompts detected in child output.

use std::io::BufRead;

use anyhow::{Context, Result, bail};
use tracing::debug;

/// Supplies one line of input when a child appears to be prompting.
pub trait PromptResponder {
    /// Return the answer for `prompt` without a trailing newline.
    fn respond(&mut self, prompt: &str) -> Result<String>;
}

/// Blocks on a line from the invoking user's terminal.
#[derive(Debug, Default)]
pub struct StdinResponder;

impl PromptResponder for StdinResponder {
    fn respond(&mut self, prompt: &str) -> Result<String> {
        debug!(prompt = prompt.trim(), "waiting for user input");
        read_answer(&mut std::io::stdin().lock())
    }
}

/// Read one line from `reader`, stripping the line terminator.
///
/// End of input is an error: the child is waiting and nobody can answer.
pub fn read_answer<R: BufRead>(reader: &mut R) -> Result<String> {
    let mut line = String::new();
    let n = reader.read_line(&mut line).context("read user input")?;
    if n == 0 {
        bail!("input closed while a prompt was waiting for an answer");
    }
    let trimmed = line.strip_suffix('\n').unwrap_or(&line);
    let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
    Ok(trimmed.to_string())
}
