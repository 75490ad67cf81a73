//! Status reports: a fixed-layout text snapshot of the repository.
//!
//! Each report is written to its own timestamped file and never touched
//! again:
//!
//! ```text
//! <repo>/reports/git_report_2026-01-31_09-15-02.txt
//! ```

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use jiff::Zoned;

use crate::{
    config::Config,
    git::{CommandExecutor, Git},
    sequencer::Delivery,
};

/// Directory, relative to the repository, that holds reports.
pub const REPORT_DIR: &str = "reports";

/// Porcelain status entries carry a two-letter code and a space before the path.
const STATUS_PATH_OFFSET: usize = 3;

const HEADER_RULE: usize = 40;
const SECTION_RULE: usize = 50;
const FILE_RULE: usize = 70;

/// Errors that can occur while writing a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write report in {}: {source}", dir.display())]
    Write {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// How much a report says about the working tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportDetail {
    /// Branch, last commit, and cleanliness only.
    Summary,
    /// Also itemize every changed file with its added, removed, and hunk lines.
    #[default]
    Full,
}

/// One changed path and the diff lines kept for it.
///
/// An empty `lines` means git produced no textual diff (untracked or binary).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub lines: Vec<String>,
}

/// A status report, assembled once and rendered to text.
#[derive(Debug, Clone)]
pub struct Report {
    pub generated_at: Zoned,
    pub repository: String,
    pub branch: String,
    pub last_commit: Option<String>,
    pub last_commit_date: Option<String>,
    pub dirty: bool,
    /// Outcome of the commit and push that preceded this report, if any.
    pub delivery: Option<Delivery>,
    /// Changed files; `None` for summary reports.
    pub changes: Option<Vec<FileChange>>,
}

impl Report {
    /// Query the backend and assemble a report.
    ///
    /// `delivery` is `None` when no commit or push was attempted.
    pub fn collect<E: CommandExecutor>(
        git: &Git<E>,
        config: &Config,
        detail: ReportDetail,
        delivery: Option<Delivery>,
        generated_at: Zoned,
    ) -> Self {
        let last_commit = non_empty(&git.last_commit_subject());
        let last_commit_date = non_empty(&git.last_commit_date());

        // Detached HEAD (or no repository) reports no branch.
        let branch = git
            .current_branch()
            .ok()
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| config.branch_name.clone());

        let status = git.status_porcelain();
        let dirty = !changed_paths(&status).is_empty();

        let changes = match detail {
            ReportDetail::Summary => None,
            ReportDetail::Full => Some(
                changed_paths(&status)
                    .into_iter()
                    .map(|path| {
                        let lines = retained_diff_lines(&git.diff_without_context(&path));
                        FileChange { path, lines }
                    })
                    .collect(),
            ),
        };

        Self {
            generated_at,
            repository: repository_name(config.remote_url()),
            branch,
            last_commit,
            last_commit_date,
            dirty,
            delivery,
            changes,
        }
    }

    /// Whether everything committed locally is known to be on the remote.
    pub fn pushed(&self) -> bool {
        !self.dirty
            && !matches!(
                self.delivery,
                Some(Delivery::CommitFailed | Delivery::PushFailed)
            )
    }

    /// Render the fixed text layout.
    pub fn render(&self) -> String {
        let mut lines = vec![
            "=".repeat(HEADER_RULE),
            "              Git Report".to_string(),
            format!(
                "      Generated on: {}",
                self.generated_at.strftime("%Y-%m-%d %H:%M:%S")
            ),
            "=".repeat(HEADER_RULE),
            String::new(),
            format!("Repository: {}", self.repository),
            format!("Branch: {}", self.branch),
            format!(
                "Last Commit: {}",
                self.last_commit.as_deref().unwrap_or("(No commits yet)")
            ),
            format!(
                "Last Commit Date: {}",
                self.last_commit_date.as_deref().unwrap_or("N/A")
            ),
            format!("Changes Pushed: {}", if self.pushed() { "Yes" } else { "No" }),
            format!(
                "Status: {}",
                if self.dirty {
                    "Uncommitted Changes Detected"
                } else {
                    "Up to date"
                }
            ),
        ];

        match self.changes.as_deref() {
            None => {}
            Some([]) => lines.push("No file changes detected.".to_string()),
            Some(changes) => {
                lines.push("=".repeat(SECTION_RULE));
                lines.push("Modified Files and Changes".to_string());
                lines.push("=".repeat(SECTION_RULE));
                for change in changes {
                    lines.push(format!("File Checked: {}", change.path));
                    lines.push("-".repeat(FILE_RULE));
                    if change.lines.is_empty() {
                        lines.push("No content changes detected.".to_string());
                    } else {
                        lines.extend(change.lines.iter().cloned());
                        lines.push(String::new());
                        lines.push("=".repeat(FILE_RULE));
                    }
                    lines.push(String::new());
                }
            }
        }

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    /// Write the report into `dir`, never replacing an existing file.
    ///
    /// Returns the path written.
    pub fn write(&self, dir: &Path) -> Result<PathBuf, ReportError> {
        let wrap = |source| ReportError::Write {
            dir: dir.to_path_buf(),
            source,
        };

        fs::create_dir_all(dir).map_err(wrap)?;

        let stamp = self.generated_at.strftime("%Y-%m-%d_%H-%M-%S").to_string();
        let text = self.render();

        // Same-second reports get a numeric suffix.
        for attempt in 0u32.. {
            let name = if attempt == 0 {
                format!("git_report_{stamp}.txt")
            } else {
                format!("git_report_{stamp}_{attempt}.txt")
            };
            let path = dir.join(name);

            match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    io::Write::write_all(&mut file, text.as_bytes()).map_err(wrap)?;
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(wrap(e)),
            }
        }

        Err(wrap(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "no free report file name",
        )))
    }
}

/// Human-readable repository name: the last segment of the remote URL
/// without its `.git` suffix.
///
/// Example: `https://host/org/myrepo.git` → `myrepo`.
pub fn repository_name(remote_url: Option<&str>) -> String {
    let Some(url) = remote_url else {
        return "Unknown".to_string();
    };

    let trimmed = url.trim().trim_end_matches('/');
    // scp-style remotes (`git@host:org/repo.git`) separate with a colon.
    let last = trimmed.rsplit(['/', ':']).next().unwrap_or(trimmed);
    let name = last.strip_suffix(".git").unwrap_or(last);

    if name.is_empty() {
        "Unknown".to_string()
    } else {
        name.to_string()
    }
}

/// Paths named by `git status --porcelain -z` output, one per entry.
pub fn changed_paths(status: &str) -> Vec<String> {
    let mut paths = Vec::new();
    let mut entries = status.split('\0');

    while let Some(entry) = entries.next() {
        let Some(path) = entry.get(STATUS_PATH_OFFSET..) else {
            continue;
        };
        // Renames and copies name the new path first, then the source as
        // its own entry.
        if entry.get(..2).is_some_and(|code| code.contains(['R', 'C'])) {
            entries.next();
        }
        if !path.is_empty() {
            paths.push(path.to_string());
        }
    }

    paths
}

/// Keep only added lines, removed lines, and hunk headers of a unified diff.
///
/// `---`/`+++` are file headers only between `diff --git` and the first hunk;
/// inside a hunk they are ordinary removed or added lines.
pub fn retained_diff_lines(diff: &str) -> Vec<String> {
    let mut in_hunk = false;
    let mut kept = Vec::new();

    for line in diff.lines() {
        if line.starts_with("diff ") {
            in_hunk = false;
        } else if line.starts_with("@@") {
            in_hunk = true;
            kept.push(line.to_string());
        } else if in_hunk && (line.starts_with('+') || line.starts_with('-')) {
            kept.push(line.to_string());
        }
    }

    kept
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
