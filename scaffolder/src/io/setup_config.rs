//! Setup configuration (`setup_config.json`) consumed by the step plan.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::debug;

/// Load the setup configuration as an untyped JSON object.
///
/// Contents are not validated here: the plan references keys directly and a
/// missing key surfaces when the plan is rendered.
pub fn load_setup_config(path: &Path) -> Result<Value> {
    debug!(path = %path.display(), "loading setup config");
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value: Value =
        serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    if !value.is_object() {
        bail!("{} must contain a JSON object", path.display());
    }
    Ok(value)
}
