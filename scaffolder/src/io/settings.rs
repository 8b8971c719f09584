//! Runner settings stored in `scaffolder.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::prompt::PromptDetector;

pub const DEFAULT_SETTINGS_PATH: &str = "scaffolder.toml";

/// Runner settings (TOML).
///
/// Every field has a default, so a missing file or a partial file is fine.
/// Relative paths are resolved against the directory the tool was started in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// JSON document with project naming, credentials and feature toggles.
    pub config_path: PathBuf,

    /// Plain-text file holding the last completed step.
    pub checkpoint_path: PathBuf,

    /// Step plan (TOML). The built-in plan is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_path: Option<PathBuf>,

    /// How long one poll of the PTY waits for output.
    pub poll_interval_ms: u64,

    /// Upper bound for a single read from the PTY.
    pub read_chunk_bytes: usize,

    pub prompt: PromptSettings,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PromptMode {
    #[default]
    TrailingQuestionMark,
    Patterns,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct PromptSettings {
    pub mode: PromptMode,
    /// Regular expressions matched against each trimmed output chunk (`patterns` mode).
    pub patterns: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("setup_config.json"),
            checkpoint_path: PathBuf::from("script_status.txt"),
            plan_path: None,
            poll_interval_ms: 100,
            read_chunk_bytes: 1024,
            prompt: PromptSettings::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(anyhow!("poll_interval_ms must be > 0"));
        }
        if self.read_chunk_bytes == 0 {
            return Err(anyhow!("read_chunk_bytes must be > 0"));
        }
        if self.prompt.mode == PromptMode::Patterns && self.prompt.patterns.is_empty() {
            return Err(anyhow!(
                "prompt.patterns must be a non-empty array when prompt.mode = \"patterns\""
            ));
        }
        self.prompt_detector().map(|_| ())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Compile the configured prompt heuristic.
    pub fn prompt_detector(&self) -> Result<PromptDetector> {
        match self.prompt.mode {
            PromptMode::TrailingQuestionMark => Ok(PromptDetector::TrailingQuestionMark),
            PromptMode::Patterns => {
                let compiled = self
                    .prompt
                    .patterns
                    .iter()
                    .map(|pattern| {
                        Regex::new(pattern)
                            .with_context(|| format!("invalid prompt pattern {pattern:?}"))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(PromptDetector::Patterns(compiled))
            }
        }
    }

    /// Resolve relative paths against `base`.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        self.config_path = base.join(&self.config_path);
        self.checkpoint_path = base.join(&self.checkpoint_path);
        self.plan_path = self.plan_path.map(|p| base.join(p));
        self
    }
}

/// Load settings from a TOML file.
///
/// If the file is missing, returns `Settings::default()`.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        let settings = Settings::default();
        settings.validate()?;
        return Ok(settings);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let settings: Settings =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let settings = load_settings(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.poll_interval(), Duration::from_millis(100));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("scaffolder.toml");
        fs::write(
            &path,
            "checkpoint_path = \"state/step.txt\"\n[prompt]\nmode = \"patterns\"\npatterns = [\"\\\\(y/N\\\\)$\"]\n",
        )
        .expect("write");

        let settings = load_settings(&path).expect("load");
        assert_eq!(settings.checkpoint_path, PathBuf::from("state/step.txt"));
        assert_eq!(settings.config_path, PathBuf::from("setup_config.json"));
        assert_eq!(settings.read_chunk_bytes, 1024);
        let detector = settings.prompt_detector().expect("detector");
        assert!(detector.is_prompt("Overwrite? (y/N)"));
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let settings = Settings {
            poll_interval_ms: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn patterns_mode_requires_valid_patterns() {
        let mut settings = Settings::default();
        settings.prompt.mode = PromptMode::Patterns;
        assert!(settings.validate().is_err());

        settings.prompt.patterns = vec!["(unclosed".to_string()];
        let err = settings.validate().expect_err("bad regex");
        assert!(err.to_string().contains("invalid prompt pattern"));
    }

    #[test]
    fn resolve_paths_joins_relative_entries() {
        let settings = Settings {
            plan_path: Some(PathBuf::from("plan.toml")),
            ..Settings::default()
        }
        .resolve_paths(Path::new("/work"));
        assert_eq!(settings.config_path, PathBuf::from("/work/setup_config.json"));
        assert_eq!(settings.checkpoint_path, PathBuf::from("/work/script_status.txt"));
        assert_eq!(settings.plan_path, Some(PathBuf::from("/work/plan.toml")));
    }
}
