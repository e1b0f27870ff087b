// src/db/models/dataset.rs

//! Datasets (`data_set`) and their aggregate views

use super::{
    Author, DatasetMetadata, DatasetMetrics, FeatureModel, FeatureModelDetail, FileRecord,
};
use crate::db;
use crate::error::{Error, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

/// One uploaded dataset owned by a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub id: Option<i64>,
    pub user_id: i64,
    pub ds_meta_data_id: i64,
    /// RFC 3339 creation timestamp
    pub created_at: String,
}

const COLUMNS: &str = "d.id, d.user_id, d.ds_meta_data_id, d.created_at";

impl Dataset {
    pub fn new(user_id: i64, ds_meta_data_id: i64) -> Self {
        Self {
            id: None,
            user_id,
            ds_meta_data_id,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO data_set (user_id, ds_meta_data_id, created_at) VALUES (?1, ?2, ?3)",
            params![self.user_id, self.ds_meta_data_id, &self.created_at],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let sql = format!("SELECT {COLUMNS} FROM data_set d WHERE d.id = ?1");
        let dataset = conn.query_row(&sql, [id], Self::from_row).optional()?;
        Ok(dataset)
    }

    /// Like [`Dataset::find_by_id`] but absent rows are a `NotFoundError`
    pub fn get(conn: &Connection, id: i64) -> Result<Self> {
        Self::find_by_id(conn, id)?.ok_or_else(|| Error::NotFoundError(format!("Dataset {id}")))
    }

    pub fn find_by_metadata(conn: &Connection, ds_meta_data_id: i64) -> Result<Option<Self>> {
        let sql = format!("SELECT {COLUMNS} FROM data_set d WHERE d.ds_meta_data_id = ?1");
        let dataset = conn
            .query_row(&sql, [ds_meta_data_id], Self::from_row)
            .optional()?;
        Ok(dataset)
    }

    /// Every dataset, oldest first
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let sql = format!("SELECT {COLUMNS} FROM data_set d ORDER BY d.id");
        Self::query(conn, &sql, params![])
    }

    /// Datasets of one user, newest first
    pub fn list_by_user(conn: &Connection, user_id: i64) -> Result<Vec<Self>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM data_set d WHERE d.user_id = ?1 ORDER BY d.created_at DESC, d.id DESC"
        );
        Self::query(conn, &sql, [user_id])
    }

    /// Datasets holding an archival DOI, optionally restricted to one user
    pub fn list_synchronized(conn: &Connection, user_id: Option<i64>) -> Result<Vec<Self>> {
        Self::list_by_sync_state(conn, user_id, true)
    }

    /// Datasets still waiting for an archival DOI
    pub fn list_unsynchronized(conn: &Connection, user_id: Option<i64>) -> Result<Vec<Self>> {
        Self::list_by_sync_state(conn, user_id, false)
    }

    fn list_by_sync_state(
        conn: &Connection,
        user_id: Option<i64>,
        synchronized: bool,
    ) -> Result<Vec<Self>> {
        let doi_filter = if synchronized {
            "m.dataset_doi IS NOT NULL"
        } else {
            "m.dataset_doi IS NULL"
        };
        let sql = format!(
            "SELECT {COLUMNS} FROM data_set d
             JOIN ds_meta_data m ON m.id = d.ds_meta_data_id
             WHERE {doi_filter} AND (?1 IS NULL OR d.user_id = ?1)
             ORDER BY d.id"
        );
        Self::query(conn, &sql, [user_id])
    }

    pub fn is_synchronized(conn: &Connection, id: i64) -> Result<bool> {
        let doi: Option<Option<String>> = conn
            .query_row(
                "SELECT m.dataset_doi FROM data_set d
                 JOIN ds_meta_data m ON m.id = d.ds_meta_data_id
                 WHERE d.id = ?1",
                [id],
                |row| row.get(0),
            )
            .optional()?;

        match doi {
            Some(doi) => Ok(doi.is_some()),
            None => Err(Error::NotFoundError(format!("Dataset {id}"))),
        }
    }

    pub fn count_synchronized(conn: &Connection) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM data_set d
             JOIN ds_meta_data m ON m.id = d.ds_meta_data_id
             WHERE m.dataset_doi IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn count_unsynchronized(conn: &Connection) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM data_set d
             JOIN ds_meta_data m ON m.id = d.ds_meta_data_id
             WHERE m.dataset_doi IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn file_count(conn: &Connection, id: i64) -> Result<i64> {
        FileRecord::count_for_dataset(conn, id)
    }

    pub fn total_size(conn: &Connection, id: i64) -> Result<i64> {
        FileRecord::total_size_for_dataset(conn, id)
    }

    pub fn total_size_for_human(conn: &Connection, id: i64) -> Result<String> {
        let size = Self::total_size(conn, id)?;
        Ok(human_size(u64::try_from(size).unwrap_or_default()))
    }

    /// Remove a dataset with its metadata, metrics, authors, feature models and files
    ///
    /// Audit rows are kept with their dataset reference cleared.
    pub fn delete(conn: &mut Connection, id: i64) -> Result<()> {
        db::transaction(conn, |tx| {
            let dataset = Self::get(tx, id)?;
            let metadata = DatasetMetadata::find_by_id(tx, dataset.ds_meta_data_id)?;
            let fm_metadata_ids: Vec<i64> = FeatureModel::find_by_dataset(tx, id)?
                .into_iter()
                .map(|fm| fm.fm_meta_data_id)
                .collect();

            tx.execute("DELETE FROM data_set WHERE id = ?1", [id])?;
            for fm_metadata_id in &fm_metadata_ids {
                tx.execute("DELETE FROM fm_meta_data WHERE id = ?1", [fm_metadata_id])?;
            }
            tx.execute(
                "DELETE FROM ds_meta_data WHERE id = ?1",
                [dataset.ds_meta_data_id],
            )?;
            if let Some(metrics_id) = metadata.and_then(|m| m.ds_metrics_id) {
                tx.execute("DELETE FROM ds_metrics WHERE id = ?1", [metrics_id])?;
            }

            info!(
                "Deleted dataset {} ({} feature models)",
                id,
                fm_metadata_ids.len()
            );
            Ok(())
        })
    }

    fn query<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(sql)?;
        let datasets = stmt
            .query_map(params, Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(datasets)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            user_id: row.get(1)?,
            ds_meta_data_id: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

/// A dataset with its metadata, authors, metrics and feature models loaded
#[derive(Debug, Clone)]
pub struct DatasetDetail {
    pub dataset: Dataset,
    pub metadata: DatasetMetadata,
    pub authors: Vec<Author>,
    pub metrics: Option<DatasetMetrics>,
    pub feature_models: Vec<FeatureModelDetail>,
}

impl DatasetDetail {
    pub fn load(conn: &Connection, id: i64) -> Result<Self> {
        let dataset = Dataset::get(conn, id)?;
        let metadata = DatasetMetadata::find_by_id(conn, dataset.ds_meta_data_id)?.ok_or_else(
            || Error::NotFoundError(format!("Dataset metadata {}", dataset.ds_meta_data_id)),
        )?;
        let authors = Author::find_by_dataset_metadata(conn, dataset.ds_meta_data_id)?;
        let metrics = match metadata.ds_metrics_id {
            Some(metrics_id) => DatasetMetrics::find_by_id(conn, metrics_id)?,
            None => None,
        };
        let feature_models = FeatureModel::find_by_dataset(conn, id)?
            .into_iter()
            .map(|fm| FeatureModelDetail::load(conn, fm))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            dataset,
            metadata,
            authors,
            metrics,
            feature_models,
        })
    }

    pub fn id(&self) -> i64 {
        self.dataset.id.unwrap_or_default()
    }

    pub fn files(&self) -> impl Iterator<Item = &FileRecord> {
        self.feature_models.iter().flat_map(|fm| fm.files.iter())
    }
}

/// Format a byte count with a 1024 base
pub fn human_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let size = bytes as f64;
    if size < KB {
        format!("{bytes} bytes")
    } else if size < MB {
        format!("{:.2} KB", size / KB)
    } else if size < GB {
        format!("{:.2} MB", size / MB)
    } else {
        format!("{:.2} GB", size / GB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{AuthorOwner, FeatureModelMetadata, PublicationType};

    fn seed_dataset(conn: &Connection, user_id: i64) -> i64 {
        let mut metadata = DatasetMetadata::new(
            "Dataset".to_string(),
            "Description".to_string(),
            PublicationType::Report,
        );
        let md_id = metadata.insert(conn).unwrap();
        Author::new("Doe, Jane".to_string(), AuthorOwner::Dataset(md_id))
            .insert(conn)
            .unwrap();

        let mut dataset = Dataset::new(user_id, md_id);
        let ds_id = dataset.insert(conn).unwrap();

        let mut fm_metadata = FeatureModelMetadata::new(
            "model.uvl".to_string(),
            "Model".to_string(),
            "A model".to_string(),
            PublicationType::None,
        );
        let fm_md_id = fm_metadata.insert(conn).unwrap();
        let mut fm = FeatureModel::new(ds_id, fm_md_id);
        let fm_id = fm.insert(conn).unwrap();
        FileRecord::new("model.uvl".to_string(), "abc".to_string(), 2048, fm_id)
            .insert(conn)
            .unwrap();
        ds_id
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 bytes");
        assert_eq!(human_size(2048), "2.00 KB");
        assert_eq!(human_size(3 * 1024 * 1024 / 2), "1.50 MB");
        assert_eq!(human_size(5 * 1024 * 1024 * 1024), "5.00 GB");
    }

    #[test]
    fn test_sync_state_queries() {
        let conn = crate::db::open_in_memory().unwrap();
        let first = seed_dataset(&conn, 1);
        let second = seed_dataset(&conn, 2);

        assert_eq!(Dataset::count_synchronized(&conn).unwrap(), 0);
        assert!(!Dataset::is_synchronized(&conn, first).unwrap());

        let md_id = Dataset::get(&conn, first).unwrap().ds_meta_data_id;
        DatasetMetadata::set_archival_identifier(&conn, md_id, 5, "10.5281/zenodo.5").unwrap();

        assert!(Dataset::is_synchronized(&conn, first).unwrap());
        assert_eq!(Dataset::count_synchronized(&conn).unwrap(), 1);
        assert_eq!(Dataset::count_unsynchronized(&conn).unwrap(), 1);

        let synced = Dataset::list_synchronized(&conn, None).unwrap();
        assert_eq!(synced.len(), 1);
        assert_eq!(synced[0].id, Some(first));
        assert!(Dataset::list_synchronized(&conn, Some(2)).unwrap().is_empty());
        assert_eq!(
            Dataset::list_unsynchronized(&conn, Some(2)).unwrap()[0].id,
            Some(second)
        );
        assert!(matches!(
            Dataset::is_synchronized(&conn, 999),
            Err(Error::NotFoundError(_))
        ));
    }

    #[test]
    fn test_detail_and_aggregates() {
        let conn = crate::db::open_in_memory().unwrap();
        let id = seed_dataset(&conn, 1);

        let detail = DatasetDetail::load(&conn, id).unwrap();
        assert_eq!(detail.authors.len(), 1);
        assert_eq!(detail.feature_models.len(), 1);
        assert_eq!(detail.files().count(), 1);

        assert_eq!(Dataset::file_count(&conn, id).unwrap(), 1);
        assert_eq!(Dataset::total_size(&conn, id).unwrap(), 2048);
        assert_eq!(Dataset::total_size_for_human(&conn, id).unwrap(), "2.00 KB");
    }

    #[test]
    fn test_delete_cascades_but_keeps_audit_rows() {
        let mut conn = crate::db::open_in_memory().unwrap();
        let id = seed_dataset(&conn, 1);
        conn.execute(
            "INSERT INTO ds_download_record (user_id, dataset_id, download_date, download_cookie)
             VALUES (NULL, ?1, '2024-01-01T00:00:00Z', 'tok')",
            [id],
        )
        .unwrap();

        Dataset::delete(&mut conn, id).unwrap();

        for table in ["data_set", "ds_meta_data", "fm_meta_data", "feature_model", "file", "author"] {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
                .unwrap();
            assert_eq!(count, 0, "{table} not emptied");
        }

        let orphan: Option<i64> = conn
            .query_row("SELECT dataset_id FROM ds_download_record", [], |row| row.get(0))
            .unwrap();
        assert_eq!(orphan, None);

        assert!(matches!(
            Dataset::delete(&mut conn, id),
            Err(Error::NotFoundError(_))
        ));
    }
}
