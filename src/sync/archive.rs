// src/sync/archive.rs

//! Port to the external archival (deposition) service

use crate::db::models::{Author, DatasetDetail, PublicationType};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Keyword added to every deposition
pub const HUB_KEYWORD: &str = "uvlhub";

/// One creator entry of a deposition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orcid: Option<String>,
}

impl From<&Author> for Creator {
    fn from(author: &Author) -> Self {
        Self {
            name: author.name.clone(),
            affiliation: author.affiliation.clone(),
            orcid: author.orcid.clone(),
        }
    }
}

/// Descriptive metadata sent when creating a deposition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositionMetadata {
    pub title: String,
    pub upload_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_type: Option<String>,
    pub description: String,
    pub creators: Vec<Creator>,
    pub keywords: Vec<String>,
    pub access_right: String,
    pub license: String,
}

impl DepositionMetadata {
    /// Build deposition metadata for a stored dataset
    ///
    /// Datasets without a publication type are uploaded as `dataset`,
    /// all others as `publication` of that type.
    pub fn for_dataset(detail: &DatasetDetail) -> Self {
        let metadata = &detail.metadata;
        let (upload_type, publication_type) = match metadata.publication_type {
            PublicationType::None => ("dataset", None),
            other => ("publication", Some(other.as_str().to_string())),
        };

        let mut keywords = metadata.tag_list();
        keywords.push(HUB_KEYWORD.to_string());

        Self {
            title: metadata.title.clone(),
            upload_type: upload_type.to_string(),
            publication_type,
            description: metadata.description.clone(),
            creators: detail.authors.iter().map(Creator::from).collect(),
            keywords,
            access_right: "open".to_string(),
            license: "CC-BY-4.0".to_string(),
        }
    }
}

/// A deposition created on the archival service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deposition {
    pub id: i64,
    /// Identifier grouping all versions of the record
    pub concept_record_id: String,
}

/// Operations the synchronization flow needs from an archival service
///
/// Every call is blocking. Implementations report any remote failure as
/// `ExternalServiceError`.
pub trait ArchivalService {
    fn create_deposition(&self, metadata: &DepositionMetadata) -> Result<Deposition>;

    fn upload_file(&self, deposition_id: i64, name: &str, path: &Path) -> Result<()>;

    fn publish(&self, deposition_id: i64) -> Result<()>;

    fn fetch_doi(&self, deposition_id: i64) -> Result<String>;
}
