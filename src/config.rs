//! Configuration loaded from `~/.config/streamtree/config.toml`.
//!
//! Every field has a default, so a missing file or a partial file is fine:
//!
//! ```toml
//! [http]
//! user_agent = "my-crawler/1.0"
//! timeout_secs = 15
//!
//! [discovery]
//! probe_concurrency = 4
//!
//! [crawl]
//! max_depth = 2
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub discovery: DiscoveryConfig,
    pub crawl: CrawlConfig,
}

/// Transport settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("streamtree/{}", crate::VERSION),
            connect_timeout_secs: 10,
            timeout_secs: 30,
            max_redirects: 10,
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Candidates classified at once (HEAD probes in flight).
    pub probe_concurrency: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            probe_concurrency: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub max_depth: usize,
    /// Parents refreshed at once within one level.
    pub concurrency: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            concurrency: 4,
        }
    }
}

impl Config {
    /// Load from the default location.
    ///
    /// Returns defaults if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        toml::from_str(&content).with_context(|| format!("invalid TOML in {}", path.display()))
    }
}

/// Return the path to the config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("streamtree")
        .join("config.toml")
}
