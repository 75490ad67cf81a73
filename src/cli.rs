//! CLI interface for gitpilot.
//!
//! With no arguments, runs the whole sequence against the current directory
//! using `config.json`: ensure repository, remote, and branch, stage
//! everything, commit, force-push, and write a full report.
//!
//! Every failure is recorded in `<repo>/logs/git.log`. Commit and push
//! failures don't stop the run; anything else exits non-zero.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use crate::{
    config::Config,
    git::{Git, PushMode},
    logging::{self, Journal},
    report::ReportDetail,
    sequencer::{RunPlan, Sequencer, StagePattern},
};

/// gitpilot — initialize, commit, push, and report on a repository.
#[derive(Debug, Parser)]
#[command(name = "gitpilot", version, after_long_help = USAGE_HELP)]
pub struct Cli {
    /// Configuration file: JSON (`.json`) or TOML.
    #[arg(long, global = true, default_value = "config.json")]
    config: PathBuf,

    /// Repository working directory. Created if missing.
    #[arg(long, global = true, default_value = ".")]
    repo: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

const USAGE_HELP: &str = r#"Configuration (config.json):
  {
    "remote_url": "https://github.com/org/repo.git",
    "branch_name": "main"
  }

Examples:
  gitpilot
  gitpilot run --stage src/lib.rs --message "Fix parser" --no-force
  gitpilot report --summary-only

The journal (logs/git.log) and reports (reports/) are written inside the
repository, so staging `.` picks them up. Add both to .gitignore to keep
them out of commits:
  logs/
  reports/"#;

/// Options for the full sequence.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Path to stage, relative to the repository. `.` stages everything.
    #[arg(long, default_value = ".")]
    stage: String,

    /// Commit message.
    #[arg(long, default_value = "Updated project")]
    message: String,

    /// Push with upstream tracking instead of force-pushing.
    #[arg(long)]
    no_force: bool,

    /// Leave the changed-file listing out of the report.
    #[arg(long)]
    summary_only: bool,
}

impl RunArgs {
    fn to_plan(&self) -> RunPlan {
        RunPlan {
            stage: StagePattern::parse(&self.stage),
            message: self.message.clone(),
            push: if self.no_force {
                PushMode::Tracked
            } else {
                PushMode::Force
            },
            detail: detail(self.summary_only),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the whole sequence (the default).
    Run(RunArgs),

    /// Write a status report without changing the repository.
    Report {
        /// Leave the changed-file listing out of the report.
        #[arg(long)]
        summary_only: bool,
    },
}

fn detail(summary_only: bool) -> ReportDetail {
    if summary_only {
        ReportDetail::Summary
    } else {
        ReportDetail::Full
    }
}

/// Run the CLI, returning an error message on failure.
pub fn run(cli: &Cli) -> Result<(), String> {
    let log_path = logging::log_path(&cli.repo);
    let journal = Journal::open(&log_path)
        .map_err(|e| format!("failed to open log {}: {e}", log_path.display()))?;

    let config = journal.scope(|| match Config::load(&cli.config) {
        Ok(config) => {
            info!("Loaded configuration from {}", cli.config.display());
            Ok(config)
        }
        Err(e) => {
            error!("{e}");
            Err(e.to_string())
        }
    })?;

    let sequencer = Sequencer::new(Git::new(&cli.repo), config, journal);

    let report = match &cli.command {
        None => sequencer.run(&RunPlan::default()),
        Some(Command::Run(args)) => sequencer.run(&args.to_plan()),
        Some(Command::Report { summary_only }) => {
            sequencer.generate_report(detail(*summary_only), None)
        }
    }
    .map_err(|e| e.to_string())?;

    eprintln!("Report written to {}", report.display());
    Ok(())
}
