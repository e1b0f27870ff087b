// src/config.rs
//! Configuration file parsing for fmhub
//!
//! Supports a TOML file with the following sections:
//! - [storage] - database location and storage root
//! - [integrity] - checksum algorithm for stored files
//! - [archive] - archival deposition service endpoint and credentials
//!
//! Every field has a default, so a missing file is a valid configuration.
//! `FMHUB_DB_PATH`, `FMHUB_ROOT`, `FMHUB_ARCHIVE_URL` and
//! `FMHUB_ARCHIVE_TOKEN` override the file.

use crate::db::paths;
use crate::error::{Error, Result};
use crate::hash::HashAlgorithm;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Default config file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/fmhub/fmhub.toml";

/// TOML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HubConfig {
    #[serde(default)]
    pub storage: StorageSection,

    #[serde(default)]
    pub integrity: IntegritySection,

    #[serde(default)]
    pub archive: ArchiveSection,
}

/// Storage configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    /// SQLite database file (default: `<root>/fmhub.db`)
    #[serde(default)]
    pub database: Option<PathBuf>,

    /// Directory holding `uploads/` and `temp/`
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            database: None,
            root: default_root(),
        }
    }
}

/// Integrity configuration section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntegritySection {
    /// Checksum algorithm for file records (default: md5)
    #[serde(default)]
    pub algorithm: HashAlgorithm,
}

/// Archival service configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveSection {
    /// API base URL, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token
    #[serde(default)]
    pub access_token: String,

    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// When false, datasets stay local-only
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for ArchiveSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            access_token: String::new(),
            timeout_secs: default_timeout_secs(),
            enabled: default_enabled(),
        }
    }
}

impl ArchiveSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(paths::DEFAULT_ROOT)
}

fn default_base_url() -> String {
    "https://sandbox.zenodo.org/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_enabled() -> bool {
    true
}

impl HubConfig {
    /// Load configuration from `path`, then apply environment overrides
    ///
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content).map_err(|e| {
                Error::ConfigError(format!("{}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                return Err(Error::IoError(format!(
                    "Failed to read config file {}: {e}",
                    path.display()
                )));
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document without touching the environment
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: HubConfig =
            toml::from_str(content).map_err(|e| Error::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `FMHUB_*` overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = lookup("FMHUB_DB_PATH") {
            self.storage.database = Some(PathBuf::from(db));
        }
        if let Some(root) = lookup("FMHUB_ROOT") {
            self.storage.root = PathBuf::from(root);
        }
        if let Some(url) = lookup("FMHUB_ARCHIVE_URL") {
            self.archive.base_url = url;
        }
        if let Some(token) = lookup("FMHUB_ARCHIVE_TOKEN") {
            self.archive.access_token = token;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let url = &self.archive.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::ConfigError(format!(
                "archive.base_url must be an http(s) URL, got '{url}'"
            )));
        }
        if self.archive.timeout_secs == 0 {
            return Err(Error::ConfigError(
                "archive.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.archive.enabled && self.archive.access_token.is_empty() {
            warn!("Archive enabled without an access token; synchronization will fail");
        }
        Ok(())
    }

    /// Effective database path
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database
            .clone()
            .unwrap_or_else(|| paths::default_db_path(&self.storage.root))
    }

    pub fn root(&self) -> &Path {
        &self.storage.root
    }
}
