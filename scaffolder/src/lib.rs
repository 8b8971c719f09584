//! Checkpointed project scaffolding driver.
//!
//! Runs an ordered plan of steps (generator CLIs, git, hosting CLI) and records
//! the last completed step so an interrupted run resumes where it failed. The
//! architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (command model, outcome
//!   classification, prompt detection). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (checkpoint file, settings, PTY
//!   processes). Isolated behind traits to enable scripted runners in tests.
//!
//! Orchestration modules ([`sequencer`], [`workspace`], [`status`]) coordinate
//! core logic with I/O to implement CLI commands.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod sequencer;
pub mod status;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod workspace;
