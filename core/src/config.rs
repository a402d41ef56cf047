use crate::error::NavError;
use crate::error::Result;
use crate::state::DEFAULT_HISTORY_LIMIT;
use dirs::home_dir;
use serde::Deserialize;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use tracing::debug;
use zoekt_nav_protocol::SearchOptions;

pub const CONFIG_FILENAME: &str = "config.toml";
pub const HOME_ENV_VAR: &str = "ZOEKT_NAV_HOME";
pub const URL_ENV_VAR: &str = "ZOEKT_NAV_URL";
const HOME_DIR_NAME: &str = ".zoekt-nav";

/// User configuration, read from `<home>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NavConfig {
    /// Base URL of the Zoekt web server, e.g. `http://localhost:6070`.
    #[serde(default)]
    pub url: Option<String>,

    /// Context lines requested around each match
    #[serde(default)]
    pub context_lines: u32,

    /// Maximum number of files displayed
    #[serde(default = "default_max_files")]
    pub max_files: u32,

    /// Maximum number of matches displayed
    #[serde(default = "default_max_matches")]
    pub max_matches: u32,

    /// Number of queries kept in the per-workspace history
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_max_files() -> u32 {
    100
}

fn default_max_matches() -> u32 {
    1000
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            url: None,
            context_lines: 0,
            max_files: default_max_files(),
            max_matches: default_max_matches(),
            history_limit: default_history_limit(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl NavConfig {
    /// Loads `<home>/config.toml` (defaults when absent) and applies
    /// environment overrides.
    pub fn load(home: &Path) -> Result<Self> {
        let path = home.join(CONFIG_FILENAME);
        let mut config = match fs::read_to_string(&path) {
            Ok(text) => toml::from_str(&text).map_err(|source| NavError::ParseConfig {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("no config at {}, using defaults", path.display());
                Self::default()
            }
            Err(err) => return Err(NavError::read(path, err)),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(URL_ENV_VAR)
            && !url.trim().is_empty()
        {
            self.url = Some(url);
        }
    }

    /// The configured backend URL without a trailing slash.
    pub fn backend_url(&self) -> Result<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .ok_or(NavError::MissingBackendUrl)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_files == 0 {
            return Err(NavError::InvalidConfig("max_files must be > 0".to_string()));
        }
        if self.max_matches == 0 {
            return Err(NavError::InvalidConfig(
                "max_matches must be > 0".to_string(),
            ));
        }
        if self.history_limit == 0 {
            return Err(NavError::InvalidConfig(
                "history_limit must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn search_options(&self) -> SearchOptions {
        let defaults = SearchOptions::default();
        SearchOptions {
            num_context_lines: self.context_lines,
            max_doc_display_count: self.max_files,
            max_match_display_count: self.max_matches,
            shard_max_match_count: defaults.shard_max_match_count.max(self.max_matches),
            total_max_match_count: defaults.total_max_match_count.max(self.max_matches),
            ..defaults
        }
    }
}

/// Resolves the data directory: explicit override, then `ZOEKT_NAV_HOME`,
/// then `~/.zoekt-nav`.
pub fn detect_home(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Ok(env_home) = std::env::var(HOME_ENV_VAR)
        && !env_home.is_empty()
    {
        return Ok(PathBuf::from(env_home));
    }

    let mut home = home_dir().ok_or(NavError::NoHomeDirectory)?;
    home.push(HOME_DIR_NAME);
    Ok(home)
}
