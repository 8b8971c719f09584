//! Step plan loading and rendering.
//!
//! A plan is an ordered list of step descriptors kept as data (TOML). Each
//! string is a minijinja template rendered against the setup configuration, so
//! steps can be added, reordered or emptied without touching the sequencer.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use minijinja::{Environment, UndefinedBehavior};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::core::types::{Command, Step};

const DEFAULT_PLAN: &str = include_str!("plans/default.toml");

/// Unrendered plan as read from TOML.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PlanTemplate {
    /// Environment passed to every spawned command (e.g. `GITHUB_TOKEN`).
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default, rename = "step")]
    pub steps: Vec<StepTemplate>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StepTemplate {
    pub number: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub workdir: Option<String>,
    #[serde(default)]
    pub commands: Vec<CommandTemplate>,
}

/// `{ cd = "dir" }` or `{ run = ["prog", "arg", ...] }`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandTemplate {
    Cd(String),
    Run(Vec<String>),
}

impl PlanTemplate {
    /// The plan shipped with the binary.
    pub fn builtin() -> Result<Self> {
        Self::parse(DEFAULT_PLAN).context("parse built-in plan")
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Render every template against `config`.
    ///
    /// Fails on the first undefined key so that nothing runs with a
    /// half-rendered plan.
    pub fn render(&self, config: &Value) -> Result<Vec<Step>> {
        let renderer = Renderer::new(config);

        let env = self
            .env
            .iter()
            .map(|(key, tpl)| {
                let value = renderer
                    .render(tpl)
                    .with_context(|| format!("render env {key}"))?;
                Ok((key.clone(), value))
            })
            .collect::<Result<Vec<_>>>()?;

        self.steps
            .iter()
            .map(|step| {
                render_step(&renderer, step, &env)
                    .with_context(|| format!("render step {}", step.number))
            })
            .collect()
    }
}

fn render_step(renderer: &Renderer, step: &StepTemplate, env: &[(String, String)]) -> Result<Step> {
    let workdir = match &step.workdir {
        Some(tpl) => Some(PathBuf::from(renderer.render(tpl)?)),
        None => None,
    };
    let mut commands = Vec::with_capacity(step.commands.len());
    for command in &step.commands {
        commands.push(match command {
            CommandTemplate::Cd(tpl) => {
                let path = renderer.render(tpl)?;
                if path.trim().is_empty() {
                    bail!("cd target {tpl:?} rendered to an empty path");
                }
                Command::ChangeDirectory(PathBuf::from(path))
            }
            CommandTemplate::Run(tokens) => {
                let mut argv = Vec::with_capacity(tokens.len());
                for tpl in tokens {
                    let token = renderer.render(tpl)?;
                    if !token.is_empty() {
                        argv.push(token);
                    }
                }
                if argv.is_empty() {
                    bail!("command rendered to an empty argv");
                }
                Command::Invoke {
                    argv,
                    env: env.to_vec(),
                }
            }
        });
    }
    Ok(Step {
        number: step.number,
        name: step.name.clone(),
        workdir,
        commands,
    })
}

struct Renderer {
    env: Environment<'static>,
    ctx: minijinja::Value,
}

impl Renderer {
    fn new(config: &Value) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        Self {
            env,
            ctx: minijinja::Value::from_serialize(config),
        }
    }

    fn render(&self, template: &str) -> Result<String> {
        self.env
            .render_str(template, &self.ctx)
            .with_context(|| format!("render template {template:?}"))
    }
}

/// Load the plan at `path`, or the built-in plan when `path` is `None`.
pub fn load_plan(path: Option<&Path>) -> Result<PlanTemplate> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading plan");
            let contents =
                fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            PlanTemplate::parse(&contents).with_context(|| format!("parse {}", path.display()))
        }
        None => {
            debug!("using built-in plan");
            PlanTemplate::builtin()
        }
    }
}
