// src/db/models/feature_model.rs

//! Feature models of a dataset and their per-file metadata

use super::metadata::{PublicationType, publication_type_column, split_tags};
use super::{Author, FileRecord};
use crate::error::{Error, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};

/// Per-file descriptive record (`fm_meta_data`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureModelMetadata {
    pub id: Option<i64>,
    pub uvl_filename: String,
    pub title: String,
    pub description: String,
    pub publication_type: PublicationType,
    pub publication_doi: Option<String>,
    pub tags: Option<String>,
    pub uvl_version: Option<String>,
}

impl FeatureModelMetadata {
    pub fn new(
        uvl_filename: String,
        title: String,
        description: String,
        publication_type: PublicationType,
    ) -> Self {
        Self {
            id: None,
            uvl_filename,
            title,
            description,
            publication_type,
            publication_doi: None,
            tags: None,
            uvl_version: None,
        }
    }

    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO fm_meta_data (uvl_filename, title, description, publication_type,
                                       publication_doi, tags, uvl_version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &self.uvl_filename,
                &self.title,
                &self.description,
                self.publication_type.as_str(),
                &self.publication_doi,
                &self.tags,
                &self.uvl_version,
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let metadata = conn
            .query_row(
                "SELECT id, uvl_filename, title, description, publication_type,
                        publication_doi, tags, uvl_version
                 FROM fm_meta_data WHERE id = ?1",
                [id],
                Self::from_row,
            )
            .optional()?;
        Ok(metadata)
    }

    pub fn tag_list(&self) -> Vec<String> {
        split_tags(self.tags.as_deref())
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            uvl_filename: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            publication_type: publication_type_column(row, 4)?,
            publication_doi: row.get(5)?,
            tags: row.get(6)?,
            uvl_version: row.get(7)?,
        })
    }
}

/// Link between a dataset and one uploaded model (`feature_model`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureModel {
    pub id: Option<i64>,
    pub data_set_id: i64,
    pub fm_meta_data_id: i64,
}

impl FeatureModel {
    pub fn new(data_set_id: i64, fm_meta_data_id: i64) -> Self {
        Self {
            id: None,
            data_set_id,
            fm_meta_data_id,
        }
    }

    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO feature_model (data_set_id, fm_meta_data_id) VALUES (?1, ?2)",
            params![self.data_set_id, self.fm_meta_data_id],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Feature models of a dataset in upload order
    pub fn find_by_dataset(conn: &Connection, data_set_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, data_set_id, fm_meta_data_id
             FROM feature_model WHERE data_set_id = ?1 ORDER BY id",
        )?;
        let models = stmt
            .query_map([data_set_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(models)
    }

    pub fn count_for_dataset(conn: &Connection, data_set_id: i64) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM feature_model WHERE data_set_id = ?1",
            [data_set_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            data_set_id: row.get(1)?,
            fm_meta_data_id: row.get(2)?,
        })
    }
}

/// A feature model with everything hanging off it
#[derive(Debug, Clone)]
pub struct FeatureModelDetail {
    pub feature_model: FeatureModel,
    pub metadata: FeatureModelMetadata,
    pub authors: Vec<Author>,
    pub files: Vec<FileRecord>,
}

impl FeatureModelDetail {
    pub fn load(conn: &Connection, feature_model: FeatureModel) -> Result<Self> {
        let metadata = FeatureModelMetadata::find_by_id(conn, feature_model.fm_meta_data_id)?
            .ok_or_else(|| {
                Error::NotFoundError(format!(
                    "Feature model metadata {}",
                    feature_model.fm_meta_data_id
                ))
            })?;
        let authors = Author::find_by_fm_metadata(conn, feature_model.fm_meta_data_id)?;
        let files = match feature_model.id {
            Some(id) => FileRecord::find_by_feature_model(conn, id)?,
            None => Vec::new(),
        };

        Ok(Self {
            feature_model,
            metadata,
            authors,
            files,
        })
    }
}
