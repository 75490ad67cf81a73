//! Backend: drive the `git` executable.
//!
//! Every call goes through a [`CommandExecutor`] so the sequencer can be
//! exercised without spawning processes. Non-zero exits come back as data in
//! [`CommandOutput`]; only [`Git::run`] turns them into errors.

use std::{
    io,
    path::{Path, PathBuf},
    process::Command,
};

/// Name under which the configured remote is registered.
pub const REMOTE_NAME: &str = "origin";

/// Exit status and captured output of one backend invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs a program with arguments in a working directory.
pub trait CommandExecutor {
    fn execute(&self, program: &str, args: &[String], cwd: &Path) -> io::Result<CommandOutput>;
}

/// Spawns real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

impl CommandExecutor for ProcessExecutor {
    fn execute(&self, program: &str, args: &[String], cwd: &Path) -> io::Result<CommandOutput> {
        let output = Command::new(program).args(args).current_dir(cwd).output()?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Errors from invoking the backend.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` failed with code {code:?}: {stderr}")]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// How a push treats the remote branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushMode {
    /// `push -u`: establish upstream tracking.
    Tracked,
    /// `push -f`: overwrite remote history.
    Force,
}

/// A repository driven through the `git` executable.
#[derive(Debug, Clone)]
pub struct Git<E = ProcessExecutor> {
    repo: PathBuf,
    executor: E,
}

impl Git<ProcessExecutor> {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self::with_executor(repo, ProcessExecutor)
    }
}

impl<E: CommandExecutor> Git<E> {
    pub fn with_executor(repo: impl Into<PathBuf>, executor: E) -> Self {
        Self {
            repo: repo.into(),
            executor,
        }
    }

    /// The repository working directory.
    pub fn repo(&self) -> &Path {
        &self.repo
    }

    /// Whether the repository marker exists.
    pub fn is_initialized(&self) -> bool {
        self.repo.join(".git").exists()
    }

    // ── Invocation ──

    /// Run git and return its output whatever the exit status.
    pub fn exec(&self, args: &[&str]) -> Result<CommandOutput, GitError> {
        let args: Vec<String> = args.iter().map(ToString::to_string).collect();
        self.executor
            .execute("git", &args, &self.repo)
            .map_err(|source| GitError::Spawn {
                command: format!("git {}", args.join(" ")),
                source,
            })
    }

    /// Run git and return stdout, failing on a non-zero exit.
    pub fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.exec(args)?;
        if output.success() {
            return Ok(output.stdout);
        }

        // Some failures (e.g. `commit` with nothing staged) only report on stdout.
        let stderr = if output.stderr.trim().is_empty() {
            output.stdout
        } else {
            output.stderr
        };

        Err(GitError::Failed {
            command: format!("git {}", args.join(" ")),
            code: output.code,
            stderr: stderr.trim().to_string(),
        })
    }

    /// Stdout of a read-only query, or empty when git fails.
    pub fn query(&self, args: &[&str]) -> String {
        match self.exec(args) {
            Ok(output) if output.success() => output.stdout,
            _ => String::new(),
        }
    }

    // ── Repository ──

    pub fn init(&self) -> Result<(), GitError> {
        self.run(&["init"]).map(drop)
    }

    pub fn has_commits(&self) -> bool {
        self.exec(&["rev-parse", "--verify", "--quiet", "HEAD"])
            .is_ok_and(|output| output.success())
    }

    // ── Remotes ──

    /// Names of registered remotes.
    pub fn remotes(&self) -> Result<Vec<String>, GitError> {
        let stdout = self.run(&["remote"])?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    pub fn add_remote(&self, name: &str, url: &str) -> Result<(), GitError> {
        self.run(&["remote", "add", name, url]).map(drop)
    }

    // ── Branches ──

    /// The checked-out branch, empty when HEAD is detached.
    pub fn current_branch(&self) -> Result<String, GitError> {
        Ok(self.run(&["branch", "--show-current"])?.trim().to_string())
    }

    pub fn branch_exists(&self, name: &str) -> bool {
        let reference = format!("refs/heads/{name}");
        self.exec(&["rev-parse", "--verify", "--quiet", &reference])
            .is_ok_and(|output| output.success())
    }

    pub fn create_and_switch(&self, name: &str) -> Result<(), GitError> {
        self.run(&["checkout", "-b", name]).map(drop)
    }

    pub fn switch(&self, name: &str) -> Result<(), GitError> {
        self.run(&["checkout", name]).map(drop)
    }

    /// Point an unborn HEAD at `name` so the first commit lands there.
    pub fn point_unborn_head(&self, name: &str) -> Result<(), GitError> {
        let reference = format!("refs/heads/{name}");
        self.run(&["symbolic-ref", "HEAD", &reference]).map(drop)
    }

    // ── Changes ──

    pub fn add(&self, pattern: &str) -> Result<(), GitError> {
        self.run(&["add", "--", pattern]).map(drop)
    }

    pub fn commit(&self, message: &str) -> Result<(), GitError> {
        self.run(&["commit", "-m", message]).map(drop)
    }

    pub fn push(&self, remote: &str, branch: &str, mode: PushMode) -> Result<(), GitError> {
        let flag = match mode {
            PushMode::Tracked => "-u",
            PushMode::Force => "-f",
        };
        self.run(&["push", flag, remote, branch]).map(drop)
    }

    // ── Queries ──

    pub fn last_commit_subject(&self) -> String {
        self.query(&["log", "-1", "--pretty=format:%s"])
    }

    pub fn last_commit_date(&self) -> String {
        self.query(&["log", "-1", "--pretty=format:%ci"])
    }

    /// NUL-terminated porcelain status; paths are never quoted or escaped.
    pub fn status_porcelain(&self) -> String {
        self.query(&["status", "--porcelain", "-z"])
    }

    /// Unified diff of `path` against the index, without context lines.
    pub fn diff_without_context(&self, path: &str) -> String {
        self.query(&["diff", "--unified=0", "--", path])
    }
}
