//! The run journal: an append-only, leveled text log.
//!
//! Lines look like `2026-01-31 09:15:02 - INFO - Staged files matching pattern: .`
//!
//! A [`Journal`] owns its own `tracing` dispatcher instead of installing a
//! global subscriber. Code that should log into it runs inside
//! [`Journal::scope`].

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use jiff::Zoned;
use tracing::{Dispatch, Event, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter, format::Writer},
    registry::LookupSpan,
};

/// Environment variable holding an optional level filter (e.g. `debug`).
pub const FILTER_ENV: &str = "GITPILOT_LOG";

/// Journal location for a repository: `<repo>/logs/git.log`.
pub fn log_path(repo: &Path) -> PathBuf {
    repo.join("logs").join("git.log")
}

/// Handle to the run journal.
#[derive(Clone)]
pub struct Journal {
    dispatch: Dispatch,
}

impl Journal {
    /// Open the journal at `path` for appending, creating parent directories.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self::with_writer(Mutex::new(file)))
    }

    /// Build a journal writing through any `tracing-subscriber` writer.
    pub fn with_writer<W>(writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let filter =
            EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(writer)
            .event_format(LineFormat)
            .finish();

        Self {
            dispatch: Dispatch::new(subscriber),
        }
    }

    /// Run `f` with events recorded into this journal.
    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

/// `timestamp - LEVEL - message`, one event per line.
struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let now = Zoned::now();
        write!(
            writer,
            "{} - {} - ",
            now.strftime("%Y-%m-%d %H:%M:%S"),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;
    use tracing::{error, info};

    #[test]
    fn lines_carry_timestamp_level_and_message() {
        let (journal, captured) = capture::journal();

        journal.scope(|| info!("Git repository already exists"));

        let contents = captured.contents();
        let line = contents.lines().next().unwrap();
        let parts: Vec<&str> = line.splitn(3, " - ").collect();
        assert_eq!(parts.len(), 3, "unexpected line: {line}");
        assert_eq!(parts[0].len(), "2026-01-31 09:15:02".len());
        assert_eq!(parts[1], "INFO");
        assert_eq!(parts[2], "Git repository already exists");
    }

    #[test]
    fn events_outside_scope_are_not_recorded() {
        let (journal, captured) = capture::journal();

        error!("not for this journal");
        journal.scope(|| error!("Cannot stage"));

        let contents = captured.contents();
        assert!(!contents.contains("not for this journal"));
        assert!(contents.contains(" - ERROR - Cannot stage"));
    }

    #[test]
    fn open_creates_directory_and_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("git.log");

        Journal::open(&path).unwrap().scope(|| info!("first"));
        Journal::open(&path).unwrap().scope(|| info!("second"));

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("INFO - first"));
        assert!(lines[1].ends_with("INFO - second"));
    }
}
