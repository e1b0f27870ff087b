// src/db/models/metadata.rs

//! Dataset-level metadata and the publication-type vocabulary

use crate::error::{Error, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Publication kinds understood by the archival service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationType {
    None,
    AnnotationCollection,
    Book,
    Section,
    ConferencePaper,
    DataManagementPlan,
    Article,
    Patent,
    Preprint,
    Deliverable,
    Milestone,
    Proposal,
    Report,
    SoftwareDocumentation,
    TaxonomicTreatment,
    TechnicalNote,
    Thesis,
    WorkingPaper,
    Other,
}

impl PublicationType {
    pub const ALL: [PublicationType; 19] = [
        PublicationType::None,
        PublicationType::AnnotationCollection,
        PublicationType::Book,
        PublicationType::Section,
        PublicationType::ConferencePaper,
        PublicationType::DataManagementPlan,
        PublicationType::Article,
        PublicationType::Patent,
        PublicationType::Preprint,
        PublicationType::Deliverable,
        PublicationType::Milestone,
        PublicationType::Proposal,
        PublicationType::Report,
        PublicationType::SoftwareDocumentation,
        PublicationType::TaxonomicTreatment,
        PublicationType::TechnicalNote,
        PublicationType::Thesis,
        PublicationType::WorkingPaper,
        PublicationType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationType::None => "none",
            PublicationType::AnnotationCollection => "annotationcollection",
            PublicationType::Book => "book",
            PublicationType::Section => "section",
            PublicationType::ConferencePaper => "conferencepaper",
            PublicationType::DataManagementPlan => "datamanagementplan",
            PublicationType::Article => "article",
            PublicationType::Patent => "patent",
            PublicationType::Preprint => "preprint",
            PublicationType::Deliverable => "deliverable",
            PublicationType::Milestone => "milestone",
            PublicationType::Proposal => "proposal",
            PublicationType::Report => "report",
            PublicationType::SoftwareDocumentation => "softwaredocumentation",
            PublicationType::TaxonomicTreatment => "taxonomictreatment",
            PublicationType::TechnicalNote => "technicalnote",
            PublicationType::Thesis => "thesis",
            PublicationType::WorkingPaper => "workingpaper",
            PublicationType::Other => "other",
        }
    }
}

impl fmt::Display for PublicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublicationType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Invalid publication type: {s}"))
    }
}

/// Parse a stored publication type inside a row mapper
pub(crate) fn publication_type_column(row: &Row, idx: usize) -> rusqlite::Result<PublicationType> {
    let value: String = row.get(idx)?;
    value.parse::<PublicationType>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
        )
    })
}

/// Split a stored comma-separated tag string
pub fn split_tags(tags: Option<&str>) -> Vec<String> {
    tags.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Descriptive record of one dataset (`ds_meta_data`)
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetMetadata {
    pub id: Option<i64>,
    /// Remote deposition id, set together with `dataset_doi`
    pub deposition_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub publication_type: PublicationType,
    /// DOI of the paper the dataset accompanies
    pub publication_doi: Option<String>,
    /// DOI issued by the archival service; `None` until synchronized
    pub dataset_doi: Option<String>,
    /// Comma-separated tags
    pub tags: Option<String>,
    /// Average of all ratings, derived
    pub rating: f64,
    pub ds_metrics_id: Option<i64>,
}

const COLUMNS: &str = "id, deposition_id, title, description, publication_type, publication_doi, \
                       dataset_doi, tags, rating, ds_metrics_id";

impl DatasetMetadata {
    pub fn new(title: String, description: String, publication_type: PublicationType) -> Self {
        Self {
            id: None,
            deposition_id: None,
            title,
            description,
            publication_type,
            publication_doi: None,
            dataset_doi: None,
            tags: None,
            rating: 0.0,
            ds_metrics_id: None,
        }
    }

    /// Insert this metadata row
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO ds_meta_data (deposition_id, title, description, publication_type,
                                       publication_doi, dataset_doi, tags, rating, ds_metrics_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                &self.deposition_id,
                &self.title,
                &self.description,
                self.publication_type.as_str(),
                &self.publication_doi,
                &self.dataset_doi,
                &self.tags,
                self.rating,
                &self.ds_metrics_id,
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let sql = format!("SELECT {COLUMNS} FROM ds_meta_data WHERE id = ?1");
        let metadata = conn.query_row(&sql, [id], Self::from_row).optional()?;
        Ok(metadata)
    }

    /// Find metadata by its archival DOI (no redirect handling)
    pub fn find_by_doi(conn: &Connection, doi: &str) -> Result<Option<Self>> {
        let sql = format!("SELECT {COLUMNS} FROM ds_meta_data WHERE dataset_doi = ?1");
        let metadata = conn.query_row(&sql, [doi], Self::from_row).optional()?;
        Ok(metadata)
    }

    /// Link the metrics row computed at ingestion
    pub fn attach_metrics(conn: &Connection, id: i64, metrics_id: i64) -> Result<()> {
        let updated = conn.execute(
            "UPDATE ds_meta_data SET ds_metrics_id = ?1 WHERE id = ?2",
            params![metrics_id, id],
        )?;
        if updated == 0 {
            return Err(Error::NotFoundError(format!("Dataset metadata {id}")));
        }
        Ok(())
    }

    /// Record the remote deposition id and DOI in one write
    pub fn set_archival_identifier(
        conn: &Connection,
        id: i64,
        deposition_id: i64,
        doi: &str,
    ) -> Result<()> {
        let updated = conn.execute(
            "UPDATE ds_meta_data SET deposition_id = ?1, dataset_doi = ?2 WHERE id = ?3",
            params![deposition_id, doi, id],
        )?;
        if updated == 0 {
            return Err(Error::NotFoundError(format!("Dataset metadata {id}")));
        }
        Ok(())
    }

    pub fn is_synchronized(&self) -> bool {
        self.dataset_doi.is_some()
    }

    pub fn tag_list(&self) -> Vec<String> {
        split_tags(self.tags.as_deref())
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            deposition_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            publication_type: publication_type_column(row, 4)?,
            publication_doi: row.get(5)?,
            dataset_doi: row.get(6)?,
            tags: row.get(7)?,
            rating: row.get(8)?,
            ds_metrics_id: row.get(9)?,
        })
    }
}
