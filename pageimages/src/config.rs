//! Configuration loading
//!
//! All settings live in one immutable [`PageImagesConfig`] injected into the
//! scorer and denylist resolver. The config file is located in this order:
//! 1. Explicit path (command-line argument)
//! 2. `PAGEIMAGES_CONFIG` environment variable
//! 3. `<config dir>/pageimages/config.toml`
//! 4. Compiled defaults when no file exists

use crate::denylist::DenylistSource;
use crate::scoring::ScoreConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "PAGEIMAGES_CONFIG";

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageImagesConfig {
    pub scores: ScoreConfig,
    pub denylist: DenylistConfig,
    /// Extensions recognized in remote denylist file links
    pub file_extensions: Vec<String>,
    /// Namespace prefixes that mark a link as a file link
    pub file_namespace_aliases: Vec<String>,
    /// Page namespaces whose pages get a page image
    pub namespaces: Vec<i64>,
    pub logging: LoggingConfig,
}

impl Default for PageImagesConfig {
    fn default() -> Self {
        Self {
            scores: ScoreConfig::default(),
            denylist: DenylistConfig::default(),
            file_extensions: ["png", "gif", "jpg", "jpeg", "webp", "svg"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            file_namespace_aliases: vec!["File".to_string(), "Image".to_string()],
            namespaces: vec![0],
            logging: LoggingConfig::default(),
        }
    }
}

impl PageImagesConfig {
    /// Whether pages in `namespace` should be processed at all
    pub fn should_process(&self, namespace: i64) -> bool {
        self.namespaces.contains(&namespace)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PageImagesConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would break resolution at runtime
    pub fn validate(&self) -> Result<()> {
        if self.denylist.cache_key.trim().is_empty() {
            return Err(Error::Config("denylist.cache_key must not be empty".to_string()));
        }
        if self.denylist.fetch_timeout_secs == 0 {
            return Err(Error::Config("denylist.fetch_timeout_secs must be positive".to_string()));
        }
        Ok(())
    }
}

/// Denylist sources and cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenylistConfig {
    /// Consulted in order; contributions are concatenated
    pub sources: Vec<DenylistSource>,
    pub ttl_secs: u64,
    pub cache_key: String,
    pub fetch_timeout_secs: u64,
}

impl Default for DenylistConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            ttl_secs: 15 * 60,
            cache_key: "pageimages-denylist".to_string(),
            fetch_timeout_secs: 3,
        }
    }
}

impl DenylistConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Locate the config file, if any
///
/// An explicit path is returned even when it does not exist so the caller
/// can report it.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join("pageimages").join("config.toml"))
        .filter(|p| p.exists())
}

/// Load configuration, falling back to defaults when no file is found
///
/// A missing explicitly-named file is an error; an unparseable file always is.
pub fn load_config(cli_arg: Option<&Path>) -> Result<PageImagesConfig> {
    let Some(path) = resolve_config_path(cli_arg) else {
        info!("No config file found, using compiled defaults");
        return Ok(PageImagesConfig::default());
    };

    if !path.exists() {
        if cli_arg.is_some() {
            return Err(Error::Config(format!("Config file not found: {}", path.display())));
        }
        warn!(path = %path.display(), "Config file missing, using compiled defaults");
        return Ok(PageImagesConfig::default());
    }

    let content = std::fs::read_to_string(&path)?;
    let config = PageImagesConfig::from_toml_str(&content)?;
    info!(path = %path.display(), sources = config.denylist.sources.len(), "Loaded config");
    Ok(config)
}
