// src/commands/mod.rs
//! Command handlers for the fmhub CLI

mod archive;
mod dataset;
mod redirect;

pub use archive::{cmd_export, cmd_export_all, cmd_sync};
pub use dataset::{
    cmd_delete, cmd_ingest, cmd_init, cmd_list, cmd_rate, cmd_show, cmd_stage,
};
pub use redirect::{cmd_redirect_add, cmd_redirect_list, cmd_resolve};

use anyhow::{Context, Result};
use fmhub::config::HubConfig;
use fmhub::storage::UploadStorage;
use fmhub::sync::{SynchronizationCoordinator, ZenodoClient};
use rusqlite::Connection;
use std::path::Path;
use tracing::debug;

/// Configuration and storage shared by every command
pub struct HubContext {
    pub config: HubConfig,
    pub storage: UploadStorage,
    db_path: String,
}

impl HubContext {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config = HubConfig::load(config_path).with_context(|| {
            format!("Failed to load configuration from {}", config_path.display())
        })?;
        let db_path = config.database_path().to_string_lossy().into_owned();
        debug!("Using database {} and root {}", db_path, config.root().display());

        Ok(Self {
            storage: UploadStorage::new(config.root()),
            config,
            db_path,
        })
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Open the database, creating or migrating the schema when needed
    pub fn open(&self) -> Result<Connection> {
        fmhub::db::init(&self.db_path)
            .with_context(|| format!("Failed to prepare database {}", self.db_path))?;
        Ok(fmhub::db::open(&self.db_path)?)
    }

    /// Synchronization coordinator for the configured archive
    pub fn coordinator(&self) -> Result<SynchronizationCoordinator> {
        if !self.config.archive.enabled {
            return Ok(SynchronizationCoordinator::local_only(self.storage.clone()));
        }
        let client = ZenodoClient::from_config(&self.config.archive)?;
        Ok(SynchronizationCoordinator::new(
            Box::new(client),
            self.storage.clone(),
        ))
    }
}
