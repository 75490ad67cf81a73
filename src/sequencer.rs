//! The automation sequence: bring a repository to the configured state,
//! commit, push, and report.
//!
//! Steps run in a fixed order and are each safe to re-run. Nothing is rolled
//! back. Commit and push failures are logged and the run carries on so the
//! report can still be written.

use std::{
    fs,
    path::{Path, PathBuf},
};

use jiff::Zoned;
use tracing::{error, info, warn};

use crate::{
    config::Config,
    git::{CommandExecutor, Git, GitError, ProcessExecutor, PushMode, REMOTE_NAME},
    logging::Journal,
    report::{REPORT_DIR, Report, ReportDetail, ReportError},
};

/// Errors that abort the sequence.
#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("failed to create repository directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = core::result::Result<T, SequenceError>;

/// What to stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagePattern {
    /// The whole working tree (`.`).
    All,
    /// One path, relative to the repository. Must exist.
    Path(PathBuf),
}

impl StagePattern {
    /// Interpret a user-supplied pattern; `.` means everything.
    pub fn parse(pattern: &str) -> Self {
        if pattern == "." {
            Self::All
        } else {
            Self::Path(PathBuf::from(pattern))
        }
    }
}

/// Result of a staging request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Staged,
    /// The explicit path did not exist.
    Skipped,
}

/// How far commit-and-push got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Pushed,
    CommitFailed,
    /// Committed locally but the push failed.
    PushFailed,
}

/// Everything a full run needs besides the configuration.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub stage: StagePattern,
    pub message: String,
    pub push: PushMode,
    pub detail: ReportDetail,
}

impl Default for RunPlan {
    fn default() -> Self {
        Self {
            stage: StagePattern::All,
            message: "Updated project".to_string(),
            push: PushMode::Force,
            detail: ReportDetail::Full,
        }
    }
}

/// Drives one repository through the automation steps.
pub struct Sequencer<E = ProcessExecutor> {
    git: Git<E>,
    config: Config,
    journal: Journal,
}

impl<E: CommandExecutor> Sequencer<E> {
    pub fn new(git: Git<E>, config: Config, journal: Journal) -> Self {
        Self {
            git,
            config,
            journal,
        }
    }

    pub fn repo(&self) -> &Path {
        self.git.repo()
    }

    /// Run every step in order and return the report path.
    pub fn run(&self, plan: &RunPlan) -> Result<PathBuf> {
        self.ensure_repository()?;
        self.ensure_remote()?;
        self.ensure_branch()?;
        self.stage(&plan.stage)?;
        let delivery = self.commit_and_push(&plan.message, plan.push);
        self.generate_report(plan.detail, Some(delivery))
    }

    // ── Steps ──

    /// Initialize the repository unless its marker already exists.
    pub fn ensure_repository(&self) -> Result<()> {
        self.journal.scope(|| -> Result<()> {
            if self.git.is_initialized() {
                info!("Git repository already exists");
                return Ok(());
            }

            let repo = self.repo();
            fs::create_dir_all(repo).map_err(|source| SequenceError::CreateDir {
                path: repo.to_path_buf(),
                source,
            })?;

            self.git.init().inspect_err(|e| error!("{e}"))?;
            info!("Initialized a new Git repository in {}", repo.display());
            Ok(())
        })
    }

    /// Register the configured remote when the repository has none.
    ///
    /// An existing remote is left alone, whatever its URL.
    pub fn ensure_remote(&self) -> Result<()> {
        self.journal.scope(|| -> Result<()> {
            let remotes = self.git.remotes().inspect_err(|e| error!("{e}"))?;

            if !remotes.is_empty() {
                info!("Remote already exists: {}", remotes.join(", "));
                return Ok(());
            }

            let Some(url) = self.config.remote_url() else {
                error!("Remote URL not found in the configuration");
                return Ok(());
            };

            self.git
                .add_remote(REMOTE_NAME, url)
                .inspect_err(|e| error!("{e}"))?;
            info!("Added remote {REMOTE_NAME}: {url}");
            Ok(())
        })
    }

    /// Make the configured branch current, creating it if needed.
    pub fn ensure_branch(&self) -> Result<()> {
        self.journal.scope(|| -> Result<()> {
            let target = self.config.branch_name.as_str();
            let current = self.git.current_branch().inspect_err(|e| error!("{e}"))?;

            if current == target {
                info!("Already on branch {target}");
                return Ok(());
            }

            let switched = if !self.git.has_commits() {
                // Nothing to branch from yet: rename the unborn branch instead.
                self.git.point_unborn_head(target).map(|()| {
                    info!("No commits yet; first commit will land on branch {target}");
                })
            } else if self.git.branch_exists(target) {
                self.git.switch(target).map(|()| {
                    info!("Switched to existing branch {target}");
                })
            } else {
                self.git.create_and_switch(target).map(|()| {
                    info!("Created and switched to branch {target}");
                })
            };

            switched.inspect_err(|e| error!("Failed to switch to branch {target}: {e}"))?;
            Ok(())
        })
    }

    /// Stage `pattern`. Explicit paths must exist; missing ones are skipped.
    pub fn stage(&self, pattern: &StagePattern) -> Result<StageOutcome> {
        self.journal.scope(|| -> Result<StageOutcome> {
            let spec = match pattern {
                StagePattern::All => ".".to_string(),
                StagePattern::Path(path) => {
                    if !self.repo().join(path).exists() {
                        error!("Cannot stage: '{}' does not exist", path.display());
                        return Ok(StageOutcome::Skipped);
                    }
                    path.to_string_lossy().into_owned()
                }
            };

            self.git.add(&spec).inspect_err(|e| error!("{e}"))?;
            info!("Staged files matching pattern: {spec}");
            Ok(StageOutcome::Staged)
        })
    }

    /// Commit staged changes and push them. Never fails the run.
    pub fn commit_and_push(&self, message: &str, mode: PushMode) -> Delivery {
        self.journal.scope(|| {
            if let Err(e) = self.git.commit(message) {
                error!("Error in committing: {e}");
                return Delivery::CommitFailed;
            }
            info!("Committed changes with message: {message}");

            let branch = self.config.branch_name.as_str();
            if let Err(e) = self.git.push(REMOTE_NAME, branch, mode) {
                error!("Error in pushing: {e}");
                return Delivery::PushFailed;
            }

            match mode {
                PushMode::Tracked => info!("Pushed changes to {REMOTE_NAME}/{branch}"),
                PushMode::Force => warn!("Force-pushed changes to {REMOTE_NAME}/{branch}"),
            }
            Delivery::Pushed
        })
    }

    /// Write a status report under the repository and return its path.
    ///
    /// `delivery` is the outcome of the preceding commit and push, if any;
    /// a failed one is never reported as pushed.
    pub fn generate_report(
        &self,
        detail: ReportDetail,
        delivery: Option<Delivery>,
    ) -> Result<PathBuf> {
        self.journal.scope(|| -> Result<PathBuf> {
            let report =
                Report::collect(&self.git, &self.config, detail, delivery, Zoned::now());
            let path = report
                .write(&self.repo().join(REPORT_DIR))
                .inspect_err(|e| error!("{e}"))?;
            info!("Git report saved at {}", path.display());
            Ok(path)
        })
    }
}
