//! I/O helpers: files, settings, PTY processes.

pub mod checkpoint;
pub mod plan;
pub mod process;
pub mod pty;
pub mod responder;
pub mod runner;
pub mod settings;
pub mod setup_config;
pub mod workdir;
