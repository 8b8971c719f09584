//! Deterministic classification of a finished child process.

use crate::core::types::Command;

/// Case-insensitive marker that fails a command regardless of its exit code.
pub const ERROR_MARKER: &str = "error";

/// Why a command did not succeed.
///
/// Every variant counts as a plain failure to the sequencer; the payload only
/// feeds the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandFailure {
    /// The target of a directory change does not exist or is not accessible.
    ChangeDirectory { path: String, reason: String },
    /// The child could not be started (missing binary, PTY allocation, ...).
    Spawn { command: String, reason: String },
    /// Reading the child's output failed for a reason other than hang-up.
    Read { command: String, reason: String },
    /// The child exited non-zero or was killed by a signal.
    ExitStatus { command: String, code: Option<i32> },
    /// The combined output mentioned `error`.
    ErrorInOutput { command: String, transcript: String },
}

impl std::fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ChangeDirectory { path, reason } => {
                write!(f, "Failed to change directory to {path}: {reason}")
            }
            Self::Spawn { command, reason } => {
                write!(f, "Command execution failed ({command}): {reason}")
            }
            Self::Read { command, reason } => {
                write!(f, "Reading output of `{command}` failed: {reason}")
            }
            Self::ExitStatus {
                command,
                code: Some(code),
            } => write!(f, "Command `{command}` failed with return code {code}"),
            Self::ExitStatus { command, code: None } => {
                write!(f, "Command `{command}` was terminated by a signal")
            }
            Self::ErrorInOutput { command, .. } => {
                write!(f, "Command `{command}` reported an error in its output")
            }
        }
    }
}

impl std::error::Error for CommandFailure {}

/// Outcome of a single command: `Ok(())` is success.
pub type CommandResult = Result<(), CommandFailure>;

/// True if `transcript` contains [`ERROR_MARKER`] in any letter case.
pub fn mentions_error(transcript: &str) -> bool {
    transcript.to_lowercase().contains(ERROR_MARKER)
}

/// Classify a finished child from its transcript and exit code.
///
/// The output check takes precedence so that a tool printing `Error:` but
/// exiting 0 is still reported with its transcript.
pub fn classify_exit(command: &Command, transcript: &str, code: Option<i32>) -> CommandResult {
    if mentions_error(transcript) {
        return Err(CommandFailure::ErrorInOutput {
            command: command.to_string(),
            transcript: transcript.to_string(),
        });
    }
    match code {
        Some(0) => Ok(()),
        code => Err(CommandFailure::ExitStatus {
            command: command.to_string(),
            code,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo() -> Command {
        Command::invoke(["echo", "hi"])
    }

    #[test]
    fn clean_output_and_zero_exit_succeeds() {
        assert_eq!(classify_exit(&echo(), "all good\r\n", Some(0)), Ok(()));
    }

    #[test]
    fn empty_output_and_zero_exit_succeeds() {
        assert_eq!(classify_exit(&echo(), "", Some(0)), Ok(()));
    }

    #[test]
    fn error_text_fails_despite_zero_exit() {
        let result = classify_exit(&echo(), "Error: disk full\r\n", Some(0));
        assert!(matches!(
            result,
            Err(CommandFailure::ErrorInOutput { ref transcript, .. }) if transcript.contains("disk full")
        ));
    }

    #[test]
    fn error_match_ignores_case_and_position() {
        assert!(mentions_error("no ERRORS found"));
        assert!(mentions_error("stderror"));
        assert!(!mentions_error("err or"));
    }

    #[test]
    fn nonzero_exit_fails_with_clean_output() {
        let result = classify_exit(&echo(), "fine\n", Some(3));
        assert_eq!(
            result,
            Err(CommandFailure::ExitStatus {
                command: "echo hi".to_string(),
                code: Some(3)
            })
        );
    }

    #[test]
    fn signal_death_fails() {
        assert!(classify_exit(&echo(), "", None).is_err());
    }
}
