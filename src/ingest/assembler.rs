// src/ingest/assembler.rs

//! Atomic dataset creation from staged uploads
//!
//! Every row of a dataset (metadata, authors, dataset, feature models, files,
//! metrics) is written inside one database transaction. Staged files move to
//! permanent storage only after the commit; that move is not transactional
//! with the commit, so a crash or a failed move leaves a committed dataset
//! whose files are still in staging.

use super::request::{AuthorInput, FeatureModelInput, IngestRequest, UserProfile};
use crate::db;
use crate::db::models::{
    Author, AuthorOwner, Dataset, DatasetMetadata, DatasetMetrics, FeatureModel,
    FeatureModelMetadata, FileRecord, MetricsTotals, PublicationType,
};
use crate::error::{Error, Result};
use crate::integrity::FileIntegrity;
use crate::storage::UploadStorage;
use crate::uvl;
use rusqlite::{Connection, Transaction};
use tracing::{debug, error, info, warn};

/// Builds datasets from an [`IngestRequest`] and the user's staged files
pub struct DatasetAssembler {
    storage: UploadStorage,
    integrity: FileIntegrity,
}

impl DatasetAssembler {
    pub fn new(storage: UploadStorage, integrity: FileIntegrity) -> Self {
        Self { storage, integrity }
    }

    pub fn storage(&self) -> &UploadStorage {
        &self.storage
    }

    /// Create a dataset for `user` from `request`
    ///
    /// Validation, unreadable staged files and storage failures abort the
    /// whole unit with nothing persisted. After the commit the staged files
    /// are promoted and the staging folder is removed. If promotion fails the
    /// dataset stays committed, staging is left untouched and
    /// [`Error::PromotionError`] carries the dataset id.
    pub fn ingest(
        &self,
        conn: &mut Connection,
        request: &IngestRequest,
        user: &UserProfile,
    ) -> Result<Dataset> {
        request.validate()?;

        let dataset = db::transaction(conn, |tx| self.write_rows(tx, request, user))?;
        let dataset_id = dataset
            .id
            .ok_or_else(|| Error::DatabaseError("Committed dataset has no id".to_string()))?;
        info!(
            "Created dataset {} for user {} with {} feature model(s)",
            dataset_id,
            user.id,
            request.feature_models.len()
        );

        if let Err(e) = self.storage.promote(user.id, dataset_id, &request.filenames()) {
            error!(
                "Dataset {} committed but its files were not moved to permanent storage: {}",
                dataset_id, e
            );
            return Err(Error::PromotionError {
                dataset_id,
                message: e.to_string(),
            });
        }
        if let Err(e) = self.storage.clear_staging(user.id) {
            warn!("Failed to clear staging for user {}: {}", user.id, e);
        }

        Ok(dataset)
    }

    fn write_rows(
        &self,
        tx: &Transaction,
        request: &IngestRequest,
        user: &UserProfile,
    ) -> Result<Dataset> {
        let fields = &request.dataset;
        let publication_type = fields
            .publication_type
            .ok_or_else(|| Error::validation("dataset.publication_type", "is required"))?;

        let mut metadata = DatasetMetadata::new(
            fields.title.trim().to_string(),
            fields.description.trim().to_string(),
            publication_type,
        );
        metadata.publication_doi = non_blank(fields.publication_doi.as_deref());
        metadata.tags = non_blank(fields.tags.as_deref());
        let metadata_id = metadata.insert(tx)?;

        let mut owner = Author::new(user.author_name(), AuthorOwner::Dataset(metadata_id));
        owner.affiliation = user.affiliation.clone();
        owner.orcid = user.orcid.clone();
        owner.insert(tx)?;
        insert_authors(tx, &request.authors, AuthorOwner::Dataset(metadata_id))?;

        let mut dataset = Dataset::new(user.id, metadata_id);
        let dataset_id = dataset.insert(tx)?;

        let mut totals = MetricsTotals::default();
        for input in &request.feature_models {
            let metrics = self.write_feature_model(tx, dataset_id, user.id, input)?;
            totals.add(metrics);
        }

        let mut metrics = DatasetMetrics::from_totals(totals);
        let metrics_id = metrics.insert(tx)?;
        DatasetMetadata::attach_metrics(tx, metadata_id, metrics_id)?;
        debug!(
            "Dataset {} metrics: {} models, {} features, {} products",
            dataset_id,
            metrics.number_of_models,
            metrics.number_of_features,
            metrics.number_of_products
        );

        Ok(dataset)
    }

    fn write_feature_model(
        &self,
        tx: &Transaction,
        dataset_id: i64,
        user_id: i64,
        input: &FeatureModelInput,
    ) -> Result<uvl::ModelMetrics> {
        let mut fm_metadata = FeatureModelMetadata::new(
            input.uvl_filename.clone(),
            input.title.trim().to_string(),
            input.description.trim().to_string(),
            input.publication_type.unwrap_or(PublicationType::None),
        );
        fm_metadata.publication_doi = non_blank(input.publication_doi.as_deref());
        fm_metadata.tags = non_blank(input.tags.as_deref());
        fm_metadata.uvl_version = non_blank(input.uvl_version.as_deref());
        let fm_metadata_id = fm_metadata.insert(tx)?;
        insert_authors(tx, &input.authors, AuthorOwner::FeatureModel(fm_metadata_id))?;

        let staged = self.storage.staged_path(user_id, &input.uvl_filename)?;
        let parsed = uvl::parse_file(&staged)?;
        let digest = self.integrity.digest(&staged)?;

        let mut feature_model = FeatureModel::new(dataset_id, fm_metadata_id);
        let feature_model_id = feature_model.insert(tx)?;
        FileRecord::new(
            input.uvl_filename.clone(),
            digest.checksum,
            digest.size,
            feature_model_id,
        )
        .insert(tx)?;

        let metrics = uvl::calculate(&parsed);
        debug!(
            "{}: {} features, {} products",
            input.uvl_filename, metrics.feature_count, metrics.product_count
        );
        Ok(metrics)
    }
}

fn insert_authors(tx: &Transaction, authors: &[AuthorInput], owner: AuthorOwner) -> Result<()> {
    for input in authors {
        let mut author = Author::new(input.name.trim().to_string(), owner);
        author.affiliation = non_blank(input.affiliation.as_deref());
        author.orcid = non_blank(input.orcid.as_deref());
        author.insert(tx)?;
    }
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}
