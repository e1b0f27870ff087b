// src/sync/coordinator.rs

//! Best-effort publication of committed datasets
//!
//! The local dataset is authoritative. Remote failures never undo it; they
//! are reported as a [`SyncOutcome`] instead of an error. Deposition id and
//! DOI are written to the dataset metadata together, and only once the DOI
//! is known, so a dataset is either fully synchronized or untouched.

use super::archive::{ArchivalService, DepositionMetadata};
use crate::db::models::{DatasetDetail, DatasetMetadata};
use crate::error::Result;
use crate::storage::UploadStorage;
use rusqlite::Connection;
use std::fmt;
use tracing::{info, warn};

/// Step of the remote flow that failed after the deposition existed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStep {
    Upload,
    Publish,
    FetchDoi,
    RecordDoi,
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncStep::Upload => "upload",
            SyncStep::Publish => "publish",
            SyncStep::FetchDoi => "fetch-doi",
            SyncStep::RecordDoi => "record-doi",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Published; the DOI is stored on the dataset
    Synchronized { deposition_id: i64, doi: String },
    /// No remote entry exists; the dataset stays usable locally
    LocalOnly { reason: String },
    /// A remote entry exists but is unpublished or its DOI was not stored
    Incomplete {
        deposition_id: i64,
        step: SyncStep,
        reason: String,
    },
}

impl SyncOutcome {
    pub fn is_synchronized(&self) -> bool {
        matches!(self, SyncOutcome::Synchronized { .. })
    }

    pub fn doi(&self) -> Option<&str> {
        match self {
            SyncOutcome::Synchronized { doi, .. } => Some(doi),
            _ => None,
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Synchronized { deposition_id, doi } => {
                write!(f, "synchronized as {doi} (deposition {deposition_id})")
            }
            SyncOutcome::LocalOnly { reason } => write!(f, "local only: {reason}"),
            SyncOutcome::Incomplete {
                deposition_id,
                step,
                reason,
            } => write!(
                f,
                "incomplete: deposition {deposition_id} failed at {step}: {reason}"
            ),
        }
    }
}

/// Pushes datasets to an archival service
pub struct SynchronizationCoordinator {
    archive: Option<Box<dyn ArchivalService>>,
    storage: UploadStorage,
}

impl SynchronizationCoordinator {
    pub fn new(archive: Box<dyn ArchivalService>, storage: UploadStorage) -> Self {
        Self {
            archive: Some(archive),
            storage,
        }
    }

    /// A coordinator that never contacts a remote service
    pub fn local_only(storage: UploadStorage) -> Self {
        Self {
            archive: None,
            storage,
        }
    }

    /// Publish one committed dataset
    ///
    /// Errors are limited to loading the dataset; everything remote ends up
    /// in the outcome. An already synchronized dataset is reported as such
    /// without contacting the service.
    pub fn synchronize(&self, conn: &Connection, dataset_id: i64) -> Result<SyncOutcome> {
        let detail = DatasetDetail::load(conn, dataset_id)?;

        if let (Some(deposition_id), Some(doi)) =
            (detail.metadata.deposition_id, &detail.metadata.dataset_doi)
        {
            return Ok(SyncOutcome::Synchronized {
                deposition_id,
                doi: doi.clone(),
            });
        }

        let Some(archive) = self.archive.as_deref() else {
            return Ok(SyncOutcome::LocalOnly {
                reason: "archival service disabled".to_string(),
            });
        };

        let deposition = match archive.create_deposition(&DepositionMetadata::for_dataset(&detail)) {
            Ok(deposition) => deposition,
            Err(e) => {
                warn!("Dataset {} stays local: {}", dataset_id, e);
                return Ok(SyncOutcome::LocalOnly {
                    reason: e.to_string(),
                });
            }
        };
        let deposition_id = deposition.id;
        let incomplete = |step: SyncStep, reason: String| {
            warn!(
                "Synchronization of dataset {} stopped at {} (deposition {}): {}",
                dataset_id, step, deposition_id, reason
            );
            SyncOutcome::Incomplete {
                deposition_id,
                step,
                reason,
            }
        };

        let folder = self.storage.dataset_dir(detail.dataset.user_id, dataset_id);
        for file in detail.files() {
            if let Err(e) = archive.upload_file(deposition_id, &file.name, &folder.join(&file.name)) {
                return Ok(incomplete(SyncStep::Upload, format!("{}: {e}", file.name)));
            }
        }

        if let Err(e) = archive.publish(deposition_id) {
            return Ok(incomplete(SyncStep::Publish, e.to_string()));
        }

        let doi = match archive.fetch_doi(deposition_id) {
            Ok(doi) => doi,
            Err(e) => return Ok(incomplete(SyncStep::FetchDoi, e.to_string())),
        };

        let metadata_id = detail.dataset.ds_meta_data_id;
        if let Err(e) = DatasetMetadata::set_archival_identifier(conn, metadata_id, deposition_id, &doi) {
            return Ok(incomplete(SyncStep::RecordDoi, e.to_string()));
        }

        info!("Dataset {} synchronized as {}", dataset_id, doi);
        Ok(SyncOutcome::Synchronized { deposition_id, doi })
    }
}
