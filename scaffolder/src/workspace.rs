//! Loading settings, setup configuration and plan into a ready-to-run plan.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::core::invariants::plan_warnings;
use crate::core::types::Step;
use crate::io::checkpoint::CheckpointStore;
use crate::io::plan::load_plan;
use crate::io::settings::{Settings, load_settings};
use crate::io::setup_config::load_setup_config;

/// Command-line overrides for paths in the settings file.
#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub config: Option<PathBuf>,
    pub checkpoint: Option<PathBuf>,
    pub plan: Option<PathBuf>,
}

/// Everything a run needs, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Directory relative paths were resolved against.
    pub root: PathBuf,
    pub settings: Settings,
    pub steps: Vec<Step>,
    pub checkpoint: CheckpointStore,
}

/// Load settings from `root/settings_path`, apply `overrides`, read the setup
/// configuration and render the plan.
///
/// Any missing file or missing configuration key is an error; nothing has run
/// at this point.
pub fn load_workspace(
    root: &Path,
    settings_path: &Path,
    overrides: &PathOverrides,
) -> Result<Workspace> {
    let mut settings = load_settings(&root.join(settings_path))?;
    if let Some(config) = &overrides.config {
        settings.config_path = config.clone();
    }
    if let Some(checkpoint) = &overrides.checkpoint {
        settings.checkpoint_path = checkpoint.clone();
    }
    if let Some(plan) = &overrides.plan {
        settings.plan_path = Some(plan.clone());
    }
    let settings = settings.resolve_paths(root);
    debug!(?settings, "settings resolved");

    let config = load_setup_config(&settings.config_path)?;
    let steps = load_plan(settings.plan_path.as_deref())?
        .render(&config)
        .context("render plan")?;
    for warning in plan_warnings(&steps) {
        warn!(%warning, "plan numbering");
    }

    Ok(Workspace {
        root: root.to_path_buf(),
        checkpoint: CheckpointStore::new(&settings.checkpoint_path),
        settings,
        steps,
    })
}
