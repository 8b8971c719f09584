//! Stable exit codes for scaffolder CLI commands.

/// Command succeeded; for `run`, every step is completed.
pub const OK: i32 = 0;
/// Invalid settings/config/plan, checkpoint I/O failure, or other setup errors.
pub const INVALID: i32 = 1;
/// `scaffolder run` stopped at a failed step.
pub const STEP_FAILED: i32 = 2;
