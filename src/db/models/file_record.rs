// src/db/models/file_record.rs

//! Stored file rows (`file`)

use crate::error::Result;
use rusqlite::{Connection, Row, params};

/// One stored feature-model file
///
/// Checksum and size are computed at ingestion and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: Option<i64>,
    pub name: String,
    pub checksum: String,
    pub size: i64,
    pub feature_model_id: i64,
}

impl FileRecord {
    pub fn new(name: String, checksum: String, size: u64, feature_model_id: i64) -> Self {
        Self {
            id: None,
            name,
            checksum,
            size: i64::try_from(size).unwrap_or(i64::MAX),
            feature_model_id,
        }
    }

    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO file (name, checksum, size, feature_model_id) VALUES (?1, ?2, ?3, ?4)",
            params![&self.name, &self.checksum, self.size, self.feature_model_id],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    pub fn find_by_feature_model(conn: &Connection, feature_model_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, checksum, size, feature_model_id
             FROM file WHERE feature_model_id = ?1 ORDER BY id",
        )?;
        let files = stmt
            .query_map([feature_model_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(files)
    }

    /// Every file of a dataset, ordered by feature model then file
    pub fn find_by_dataset(conn: &Connection, dataset_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT f.id, f.name, f.checksum, f.size, f.feature_model_id
             FROM file f
             JOIN feature_model fm ON fm.id = f.feature_model_id
             WHERE fm.data_set_id = ?1
             ORDER BY fm.id, f.id",
        )?;
        let files = stmt
            .query_map([dataset_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(files)
    }

    pub fn count_for_dataset(conn: &Connection, dataset_id: i64) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM file f
             JOIN feature_model fm ON fm.id = f.feature_model_id
             WHERE fm.data_set_id = ?1",
            [dataset_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn total_size_for_dataset(conn: &Connection, dataset_id: i64) -> Result<i64> {
        let total = conn.query_row(
            "SELECT COALESCE(SUM(f.size), 0) FROM file f
             JOIN feature_model fm ON fm.id = f.feature_model_id
             WHERE fm.data_set_id = ?1",
            [dataset_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            checksum: row.get(2)?,
            size: row.get(3)?,
            feature_model_id: row.get(4)?,
        })
    }
}
