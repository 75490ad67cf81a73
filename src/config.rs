//! Gitpilot configuration.
//!
//! A flat key-value record read once at startup. JSON files (`.json`) are
//! parsed as JSON, anything else as TOML:
//!
//! ```text
//! { "remote_url": "https://github.com/org/repo.git", "branch_name": "main" }
//! ```

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;

/// Branch used when the configuration does not name one.
pub const DEFAULT_BRANCH: &str = "main";

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no config file found at {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config at {}: {message}", path.display())]
    Malformed { path: PathBuf, message: String },
}

/// Gitpilot configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Remote registered as `origin` when the repository has none.
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Branch to check out, commit on, and push.
    #[serde(default = "default_branch")]
    pub branch_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_url: None,
            branch_name: default_branch(),
        }
    }
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

impl Config {
    /// Load config from `path`.
    /// Returns an error if the file is missing, unreadable, or invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(path, &contents)
    }

    fn parse(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        let malformed = |message: String| ConfigError::Malformed {
            path: path.to_path_buf(),
            message,
        };

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let mut config: Self = if is_json {
            serde_json::from_str(contents).map_err(|e| malformed(e.to_string()))?
        } else {
            toml::from_str(contents).map_err(|e| malformed(e.to_string()))?
        };

        if config.branch_name.trim().is_empty() {
            return Err(malformed("branch_name is empty".to_string()));
        }

        config.remote_url = config.remote_url.filter(|url| !url.trim().is_empty());

        Ok(config)
    }

    /// The remote URL, if one is configured.
    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }
}
