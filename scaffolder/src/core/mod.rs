//! Deterministic, pure logic shared by the sequencer and the runner.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod classifier;
pub mod decode;
pub mod invariants;
pub mod prompt;
pub mod types;
