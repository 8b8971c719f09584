//! Command runner abstraction used by the step sequencer.
//!
//! The [`CommandRunner`] trait decouples sequencing from process execution.
//! [`PtyRunner`] is the real implementation; tests use scripted runners that
//! return predetermined outcomes without spawning anything.

use std::io::{Stdout, Write};
use std::path::Path;

use tracing::{info, instrument, warn};

use crate::core::classifier::{CommandFailure, CommandResult, classify_exit};
use crate::core::types::Command;
use crate::io::process::{PtyError, PtyOptions, run_interactive};
use crate::io::responder::{PromptResponder, StdinResponder};
use crate::io::workdir::WorkingDir;

/// Executes single commands on behalf of the sequencer.
pub trait CommandRunner {
    /// Run `command`, spawning it in `workdir` (relative to the tracked
    /// directory) when given. Never panics on command failure.
    fn run(&mut self, command: &Command, workdir: Option<&Path>) -> CommandResult;
}

/// Runs commands on a pseudo-terminal, relaying prompts to a responder.
pub struct PtyRunner<R = StdinResponder, W = Stdout> {
    workdir: WorkingDir,
    options: PtyOptions,
    responder: R,
    echo: W,
}

impl PtyRunner {
    /// Runner wired to the invoking user's terminal.
    pub fn interactive(workdir: WorkingDir, options: PtyOptions) -> Self {
        Self::with_io(workdir, options, StdinResponder, std::io::stdout())
    }
}

impl<R: PromptResponder, W: Write> PtyRunner<R, W> {
    pub fn with_io(workdir: WorkingDir, options: PtyOptions, responder: R, echo: W) -> Self {
        Self {
            workdir,
            options,
            responder,
            echo,
        }
    }

    pub fn workdir(&self) -> &WorkingDir {
        &self.workdir
    }

    pub fn responder(&self) -> &R {
        &self.responder
    }

    /// Everything written to the user so far (child output and runner notices).
    pub fn echo(&self) -> &W {
        &self.echo
    }

    fn change_directory(&mut self, path: &Path) -> CommandResult {
        match self.workdir.change(path) {
            Ok(()) => {
                self.notice(&format!("Changed directory to {}", path.display()));
                Ok(())
            }
            Err(err) => Err(CommandFailure::ChangeDirectory {
                path: path.display().to_string(),
                reason: format!("{err:#}"),
            }),
        }
    }

    fn invoke(
        &mut self,
        command: &Command,
        argv: &[String],
        env: &[(String, String)],
        workdir: Option<&Path>,
    ) -> CommandResult {
        let spawn_failure = |reason: String| CommandFailure::Spawn {
            command: command.to_string(),
            reason,
        };
        let Some((program, args)) = argv.split_first() else {
            return Err(spawn_failure("empty command".to_string()));
        };
        let cwd = self
            .workdir
            .prepare(workdir)
            .map_err(|err| spawn_failure(format!("{err:#}")))?;
        if cwd.created {
            self.notice(&format!("Created directory {}", cwd.path.display()));
        }

        info!(command = %command, cwd = %cwd.path.display(), "running command");
        let mut cmd = std::process::Command::new(program);
        cmd.args(args)
            .current_dir(&cwd.path)
            .envs(env.iter().map(|(key, value)| (key, value)));

        let output = run_interactive(cmd, &self.options, &mut self.responder, &mut self.echo)
            .map_err(|err| pty_failure(command, err))?;
        classify_exit(command, &output.transcript, output.code)
    }

    fn notice(&mut self, message: &str) {
        if let Err(err) = writeln!(self.echo, "{message}").and_then(|()| self.echo.flush()) {
            warn!(err = %err, "failed to write notice");
        }
    }
}

/// Spawn problems stay spawn failures; everything after the child started is
/// a read failure.
fn pty_failure(command: &Command, err: PtyError) -> CommandFailure {
    let command = command.to_string();
    match err {
        PtyError::Spawn(err) => CommandFailure::Spawn {
            command,
            reason: err.to_string(),
        },
        PtyError::Io(err) => CommandFailure::Read {
            command,
            reason: err.to_string(),
        },
        PtyError::Input(err) => CommandFailure::Read {
            command,
            reason: format!("{err:#}"),
        },
    }
}

impl<R: PromptResponder, W: Write> CommandRunner for PtyRunner<R, W> {
    #[instrument(skip_all, fields(command = %command))]
    fn run(&mut self, command: &Command, workdir: Option<&Path>) -> CommandResult {
        let result = match command {
            Command::ChangeDirectory(path) => self.change_directory(path),
            Command::Invoke { argv, env } => self.invoke(command, argv, env, workdir),
        };
        if let Err(failure) = &result {
            warn!(failure = %failure, "command failed");
            self.notice(&failure.to_string());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedResponder;
    use std::fs;

    fn runner(root: &Path, answers: Vec<String>) -> PtyRunner<ScriptedResponder, Vec<u8>> {
        let root = fs::canonicalize(root).expect("canonical");
        PtyRunner::with_io(
            WorkingDir::new(root),
            PtyOptions::default(),
            ScriptedResponder::new(answers),
            Vec::new(),
        )
    }

    fn sh(script: &str) -> Command {
        Command::invoke(["sh", "-c", script])
    }

    #[test]
    fn clean_zero_exit_succeeds() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut runner = runner(temp.path(), Vec::new());
        assert_eq!(runner.run(&sh("echo all good"), None), Ok(()));
    }

    #[test]
    fn error_in_output_fails_despite_zero_exit() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut runner = runner(temp.path(), Vec::new());
        let result = runner.run(&sh("echo 'Error: disk full'"), None);
        assert!(matches!(result, Err(CommandFailure::ErrorInOutput { .. })));
        let echoed = String::from_utf8_lossy(runner.echo()).to_string();
        assert!(echoed.contains("reported an error"));
    }

    #[test]
    fn nonzero_exit_fails_with_clean_output() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut runner = runner(temp.path(), Vec::new());
        let result = runner.run(&sh("echo fine; exit 2"), None);
        assert!(matches!(
            result,
            Err(CommandFailure::ExitStatus { code: Some(2), .. })
        ));
    }

    #[test]
    fn missing_program_fails_without_panicking() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut runner = runner(temp.path(), Vec::new());
        let result = runner.run(&Command::invoke(["no-such-binary-7731"]), None);
        assert!(matches!(result, Err(CommandFailure::Spawn { .. })));
    }

    #[test]
    fn cd_moves_tracked_directory_for_later_commands() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir(temp.path().join("projects")).expect("mkdir");
        let mut runner = runner(temp.path(), Vec::new());

        runner.run(&Command::cd("projects"), None).expect("cd");
        runner.run(&sh("touch marker"), None).expect("touch");

        assert!(temp.path().join("projects/marker").exists());
        assert!(runner.workdir().current().ends_with("projects"));
    }

    #[test]
    fn cd_to_missing_directory_fails() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut runner = runner(temp.path(), Vec::new());
        let before = runner.workdir().clone();
        let result = runner.run(&Command::cd("missing"), None);
        assert!(matches!(result, Err(CommandFailure::ChangeDirectory { .. })));
        assert_eq!(runner.workdir(), &before);
    }

    #[test]
    fn workdir_override_is_created_and_used() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut runner = runner(temp.path(), Vec::new());
        runner
            .run(&sh("touch here"), Some(Path::new("out/nested")))
            .expect("run");
        assert!(temp.path().join("out/nested/here").exists());
    }

    #[test]
    fn created_workdir_is_announced_on_echo() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut runner = runner(temp.path(), Vec::new());
        runner.run(&sh("true"), Some(Path::new("fresh"))).expect("run");
        runner.run(&sh("true"), Some(Path::new("fresh"))).expect("rerun");

        let echoed = String::from_utf8_lossy(runner.echo()).to_string();
        assert_eq!(echoed.matches("Created directory").count(), 1);
        assert!(echoed.contains("fresh"));
    }

    #[test]
    fn pty_read_errors_map_to_read_failures() {
        let command = sh("true");
        let io = std::io::Error::from_raw_os_error(libc::EBADF);
        assert!(matches!(
            pty_failure(&command, PtyError::Io(io)),
            CommandFailure::Read { .. }
        ));
        let input = PtyError::Input(anyhow::anyhow!("stdin closed"));
        match pty_failure(&command, input) {
            CommandFailure::Read { reason, .. } => assert!(reason.contains("stdin closed")),
            other => panic!("unexpected failure: {other:?}"),
        }
        let spawn = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert!(matches!(
            pty_failure(&command, PtyError::Spawn(spawn)),
            CommandFailure::Spawn { .. }
        ));
    }

    #[test]
    fn env_is_passed_to_child_only() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut runner = runner(temp.path(), Vec::new());
        let command = Command::Invoke {
            argv: vec![
                "sh".to_string(),
                "-c".to_string(),
                "printf %s \"$SCAFFOLDER_TEST_TOKEN\" > token.txt".to_string(),
            ],
            env: vec![("SCAFFOLDER_TEST_TOKEN".to_string(), "s3cret".to_string())],
        };
        runner.run(&command, None).expect("run");
        assert_eq!(
            fs::read_to_string(temp.path().join("token.txt")).expect("token"),
            "s3cret"
        );
        assert!(std::env::var_os("SCAFFOLDER_TEST_TOKEN").is_none());
    }

    #[test]
    fn prompt_answer_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut runner = runner(temp.path(), vec!["blue".to_string()]);
        runner
            .run(
                &sh("printf 'Favourite colour? '; read c; printf %s \"$c\" > answer.txt"),
                None,
            )
            .expect("run");
        assert_eq!(
            fs::read_to_string(temp.path().join("answer.txt")).expect("answer"),
            "blue"
        );
        runner.responder().assert_drained().expect("drained");
    }
}
