//! Checkpointed project scaffolding driver.
//!
//! Reads `scaffolder.toml`, `setup_config.json` and a step plan, then runs the
//! steps that the checkpoint (`script_status.txt`) has not recorded yet.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use scaffolder::core::types::Command as PlanCommand;
use scaffolder::exit_codes;
use scaffolder::io::process::PtyOptions;
use scaffolder::io::runner::PtyRunner;
use scaffolder::io::settings::DEFAULT_SETTINGS_PATH;
use scaffolder::io::workdir::WorkingDir;
use scaffolder::logging;
use scaffolder::sequencer::{RunStop, run_plan};
use scaffolder::status::status_report;
use scaffolder::workspace::{PathOverrides, Workspace, load_workspace};

#[derive(Parser)]
#[command(
    name = "scaffolder",
    version,
    about = "Checkpointed web project scaffolding"
)]
struct Cli {
    /// Runner settings (TOML). Missing file means defaults.
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_PATH)]
    settings: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug, Default)]
struct PathArgs {
    /// Setup configuration (JSON).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Checkpoint file holding the last completed step.
    #[arg(long)]
    checkpoint: Option<PathBuf>,
    /// Step plan (TOML). Defaults to the built-in plan.
    #[arg(long)]
    plan: Option<PathBuf>,
}

impl From<PathArgs> for PathOverrides {
    fn from(args: PathArgs) -> Self {
        Self {
            config: args.config,
            checkpoint: args.checkpoint,
            plan: args.plan,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Run every step the checkpoint has not recorded, stopping at the first failure.
    Run {
        #[command(flatten)]
        paths: PathArgs,
    },
    /// Print the checkpoint and which steps are done.
    Status {
        #[command(flatten)]
        paths: PathArgs,
    },
    /// Print the rendered commands of every step without running them.
    Plan {
        #[command(flatten)]
        paths: PathArgs,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let root = std::env::current_dir().context("read current directory")?;
    match cli.command {
        Command::Run { paths } => {
            let workspace = load_workspace(&root, &cli.settings, &paths.into())?;
            cmd_run(&workspace)
        }
        Command::Status { paths } => {
            let workspace = load_workspace(&root, &cli.settings, &paths.into())?;
            cmd_status(&workspace)
        }
        Command::Plan { paths } => {
            let workspace = load_workspace(&root, &cli.settings, &paths.into())?;
            cmd_plan(&workspace);
            Ok(exit_codes::OK)
        }
    }
}

fn cmd_run(workspace: &Workspace) -> Result<i32> {
    let options = PtyOptions::from_settings(&workspace.settings)?;
    let mut runner = PtyRunner::interactive(WorkingDir::new(&workspace.root), options);
    let outcome = run_plan(&workspace.steps, &workspace.checkpoint, &mut runner)?;
    match outcome.stop {
        RunStop::Finished => Ok(exit_codes::OK),
        RunStop::Failed { step } => {
            eprintln!("stopped at step {step}; re-run to resume from it");
            Ok(exit_codes::STEP_FAILED)
        }
    }
}

fn cmd_status(workspace: &Workspace) -> Result<i32> {
    let report = status_report(workspace)?;
    println!("checkpoint: {}", report.checkpoint);
    for step in &report.steps {
        let mark = if step.done { "done" } else { "pending" };
        println!("{:<8} {} ({} commands)", mark, step.label, step.commands);
    }
    match report.next_step() {
        Some(step) => println!("next: {}", step.label),
        None => println!("next: none, all steps completed"),
    }
    Ok(exit_codes::OK)
}

fn cmd_plan(workspace: &Workspace) {
    for step in &workspace.steps {
        println!("{}", step.label());
        if let Some(dir) = &step.workdir {
            println!("  workdir: {}", dir.display());
        }
        for command in &step.commands {
            match command {
                PlanCommand::Invoke { env, .. } if !env.is_empty() => {
                    let keys: Vec<&str> = env.iter().map(|(key, _)| key.as_str()).collect();
                    println!("  {command}  [env: {}]", keys.join(", "));
                }
                _ => println!("  {command}"),
            }
        }
    }
}
