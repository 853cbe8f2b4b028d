//! Runtime configuration loaded from `~/.config/peystream/config.toml`.
//!
//! Resolution order: built-in defaults, then the config file (if present),
//! then the `PEYSTREAM_API_BASE_URL` environment variable. The CLI applies
//! its own flags on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_MAX_ENTRIES;
use crate::error::{ConfigError, Result};

/// Environment variable selecting the upstream aggregation API.
pub const API_BASE_ENV: &str = "PEYSTREAM_API_BASE_URL";

/// Public hosted instance used when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "https://api.sansekai.my.id/api";

/// Default freshness window for cached upstream responses.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Client and cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL every endpoint path is appended to.
    pub api_base_url: String,
    /// Seconds an upstream response stays cached. `0` disables caching.
    pub cache_ttl_secs: u64,
    /// Most responses kept in the cache at once.
    pub cache_max_entries: u64,
    /// Whole-request timeout.
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_max_entries: DEFAULT_MAX_ENTRIES,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: format!("peystream/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Load defaults, the user config file and the environment.
    ///
    /// A missing config file is not an error.
    pub fn load() -> Result<Self> {
        let path = config_path();
        let config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        let config = config.apply_env_with(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file. Keys that are absent keep their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Override values from environment variables read through `lookup`.
    #[must_use]
    pub fn apply_env_with(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(API_BASE_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url;
        }
        self
    }

    /// Replace the upstream base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Check that the base URL parses as an absolute URL.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api_base_url).map_err(|source| ConfigError::InvalidBaseUrl {
            url: self.api_base_url.clone(),
            source,
        })?;
        Ok(())
    }

    /// Base URL without a trailing slash, ready for `base + "/endpoint"`.
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Return the path to the config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("peystream")
        .join("config.toml")
}
