//! Client configuration
//!
//! Loaded from `config.toml` in the platform config directory, then
//! overridden by the `FINANCE_AGENT_API_URL` environment variable.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Default backend address
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Environment variable overriding the backend address
pub const API_URL_ENV: &str = "FINANCE_AGENT_API_URL";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "finagent.db";

/// Client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend base URL
    pub api_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Where the session database lives (platform data dir when unset)
    pub data_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            data_dir: None,
        }
    }
}

impl ClientConfig {
    /// Load from the default location plus environment
    pub fn load() -> Result<Self> {
        let path = Self::project_dirs()?.config_dir().join(CONFIG_FILE);
        Self::load_from(&path)
    }

    /// Load from an explicit file plus environment. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            info!(path = %path.display(), "Loading config");
            let text = std::fs::read_to_string(path)?;
            Self::from_toml_str(&text)?
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };

        Ok(config.with_api_url_override(std::env::var(API_URL_ENV).ok()))
    }

    /// Parse TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        if config.api_url.trim().is_empty() {
            return Err(Error::Config("api_url must not be empty".into()));
        }
        Ok(config)
    }

    /// Replace the API URL when an override is given and non-empty
    pub fn with_api_url_override(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = url;
        }
        self
    }

    /// Directory holding the session database
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.data_dir().to_path_buf()),
        }
    }

    /// Path of the session database
    pub fn database_path(&self) -> Result<PathBuf> {
        Ok(self.resolve_data_dir()?.join(DATABASE_FILE))
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "finagent", "finagent").ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })
    }
}
