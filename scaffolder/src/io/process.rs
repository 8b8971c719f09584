//! Interactive child processes driven through a pseudo-terminal.
//!
//! Some generators only prompt (and only accept answers) when attached to a
//! real terminal, so children get a PTY instead of pipes. One thread alternates
//! between polling the PTY for output and checking whether the child exited.

use std::io::{self, Read, Write};
use std::os::fd::AsFd;
use std::process::{Child, Command};
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, instrument, warn};

use crate::core::decode::ChunkDecoder;
use crate::core::prompt::PromptDetector;
use crate::io::pty::{PtyPair, is_hangup, open_pty, spawn_on_pty, wait_readable};
use crate::io::responder::PromptResponder;
use crate::io::settings::Settings;

/// Tuning for [`run_interactive`].
#[derive(Debug, Clone)]
pub struct PtyOptions {
    /// Upper bound for one poll of the controller side.
    pub poll_interval: Duration,
    /// Upper bound for one read from the controller side.
    pub read_chunk_bytes: usize,
    pub detector: PromptDetector,
}

impl Default for PtyOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            read_chunk_bytes: 1024,
            detector: PromptDetector::default(),
        }
    }
}

impl PtyOptions {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            poll_interval: settings.poll_interval(),
            read_chunk_bytes: settings.read_chunk_bytes,
            detector: settings.prompt_detector()?,
        })
    }
}

/// What an interactive child left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractiveOutput {
    /// Combined stdout/stderr as seen on the terminal (CRLF line endings).
    pub transcript: String,
    /// Exit code, `None` if the child was killed by a signal.
    pub code: Option<i32>,
    /// Number of answers relayed to the child.
    pub answers: usize,
}

/// Failure modes of [`run_interactive`].
#[derive(Debug)]
pub enum PtyError {
    /// PTY allocation or process spawn failed.
    Spawn(io::Error),
    /// Polling, reading, or writing the PTY failed.
    Io(io::Error),
    /// No answer could be obtained for a detected prompt.
    Input(anyhow::Error),
}

impl std::fmt::Display for PtyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn(err) => write!(f, "spawn: {err}"),
            Self::Io(err) => write!(f, "pty i/o: {err}"),
            Self::Input(err) => write!(f, "prompt input: {err:#}"),
        }
    }
}

impl std::error::Error for PtyError {}

/// Run `cmd` on a fresh PTY until it exits.
///
/// Output is echoed to `echo` as it arrives and collected into the transcript.
/// When the child is still alive and `options.detector` flags a chunk as a
/// prompt, one line from `responder` is written back followed by `\n`.
#[instrument(skip_all, fields(program = ?cmd.get_program()))]
pub fn run_interactive<R, W>(
    cmd: Command,
    options: &PtyOptions,
    responder: &mut R,
    echo: &mut W,
) -> Result<InteractiveOutput, PtyError>
where
    R: PromptResponder + ?Sized,
    W: Write + ?Sized,
{
    let PtyPair {
        mut controller,
        dependent,
    } = open_pty().map_err(PtyError::Spawn)?;
    debug!("spawning child on pty");
    let mut child = spawn_on_pty(cmd, dependent).map_err(PtyError::Spawn)?;

    let mut session = Session {
        decoder: ChunkDecoder::new(),
        transcript: String::new(),
        buf: vec![0u8; options.read_chunk_bytes.max(1)],
        answers: 0,
    };

    let pumped = pump(&mut session, &mut child, &mut controller, options, responder, echo);
    if let Err(err) = pumped {
        warn!(err = %err, "interactive session failed, killing child");
        let _ = child.kill();
        let _ = child.wait();
        return Err(err);
    }

    let status = child.wait().map_err(PtyError::Io)?;
    drop(controller);
    session.transcript.push_str(&session.decoder.finish());

    debug!(exit_code = ?status.code(), answers = session.answers, "child finished");
    Ok(InteractiveOutput {
        transcript: session.transcript,
        code: status.code(),
        answers: session.answers,
    })
}

struct Session {
    decoder: ChunkDecoder,
    transcript: String,
    buf: Vec<u8>,
    answers: usize,
}

enum Chunk {
    Data(usize),
    /// Every dependent descriptor is closed; nothing more will arrive.
    Closed,
    /// Interrupted before any data was read.
    Retry,
}

fn pump<R, W>(
    session: &mut Session,
    child: &mut Child,
    controller: &mut std::fs::File,
    options: &PtyOptions,
    responder: &mut R,
    echo: &mut W,
) -> Result<(), PtyError>
where
    R: PromptResponder + ?Sized,
    W: Write + ?Sized,
{
    loop {
        if wait_readable(controller.as_fd(), options.poll_interval).map_err(PtyError::Io)? {
            match read_chunk(controller, &mut session.buf)? {
                Chunk::Data(n) => {
                    let text = forward(session, n, echo)?;
                    let alive = child.try_wait().map_err(PtyError::Io)?.is_none();
                    if alive && options.detector.is_prompt(&text) {
                        let answer = responder.respond(&text).map_err(PtyError::Input)?;
                        controller
                            .write_all(format!("{answer}\n").as_bytes())
                            .map_err(PtyError::Io)?;
                        session.answers += 1;
                    }
                }
                Chunk::Closed => {
                    debug!("pty closed by child");
                    return Ok(());
                }
                Chunk::Retry => {}
            }
        }
        if child.try_wait().map_err(PtyError::Io)?.is_some() {
            return drain(session, controller, options.poll_interval, echo);
        }
    }
}

/// Best-effort read of output still buffered after the child exited.
///
/// Stops at hang-up, or after `quiet` passes with no output (a grandchild may
/// keep the dependent side open).
fn drain<W: Write + ?Sized>(
    session: &mut Session,
    controller: &mut std::fs::File,
    quiet: Duration,
    echo: &mut W,
) -> Result<(), PtyError> {
    while wait_readable(controller.as_fd(), quiet).map_err(PtyError::Io)? {
        match read_chunk(controller, &mut session.buf)? {
            Chunk::Data(n) => {
                forward(session, n, echo)?;
            }
            Chunk::Closed => break,
            Chunk::Retry => {}
        }
    }
    Ok(())
}

fn read_chunk(controller: &mut std::fs::File, buf: &mut [u8]) -> Result<Chunk, PtyError> {
    match controller.read(buf) {
        Ok(0) => Ok(Chunk::Closed),
        Ok(n) => Ok(Chunk::Data(n)),
        Err(err) if is_hangup(&err) => Ok(Chunk::Closed),
        Err(err) if err.kind() == io::ErrorKind::Interrupted => Ok(Chunk::Retry),
        Err(err) => Err(PtyError::Io(err)),
    }
}

/// Echo the first `n` bytes of the buffer and append them to the transcript.
fn forward<W: Write + ?Sized>(
    session: &mut Session,
    n: usize,
    echo: &mut W,
) -> Result<String, PtyError> {
    let bytes = &session.buf[..n];
    echo.write_all(bytes).map_err(PtyError::Io)?;
    echo.flush().map_err(PtyError::Io)?;
    let text = session.decoder.push(bytes);
    session.transcript.push_str(&text);
    Ok(text)
}
