// src/db/schema.rs

//! Database schema definitions and migrations for fmhub
//!
//! Migrations are applied in order and recorded in `schema_version`.

use crate::error::{Error, Result};
use rusqlite::Connection;
use tracing::{debug, info};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

fn init_schema_version(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    init_schema_version(conn)?;

    let version = conn
        .query_row(
            "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Apply all pending migrations to bring the database up to date
pub fn migrate(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;
    debug!("Current schema version: {}", current_version);

    if current_version >= SCHEMA_VERSION {
        return Ok(());
    }

    for version in (current_version + 1)..=SCHEMA_VERSION {
        info!("Applying migration to version {}", version);
        apply_migration(conn, version)?;
        set_schema_version(conn, version)?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: i32) -> Result<()> {
    match version {
        1 => migrate_v1(conn),
        2 => migrate_v2(conn),
        _ => Err(Error::InitError(format!("Unknown migration version: {version}"))),
    }
}

/// Initial schema - Version 1
///
/// Dataset side: metrics, dataset metadata, feature-model metadata,
/// authors, datasets, feature models and their files.
fn migrate_v1(conn: &Connection) -> Result<()> {
    debug!("Creating schema version 1");

    conn.execute_batch(
        "
        -- Derived counts, one row per dataset metadata
        CREATE TABLE ds_metrics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            number_of_models INTEGER NOT NULL,
            number_of_features INTEGER NOT NULL,
            number_of_products INTEGER NOT NULL
        );

        CREATE TABLE ds_meta_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            deposition_id INTEGER,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            publication_type TEXT NOT NULL,
            publication_doi TEXT,
            dataset_doi TEXT UNIQUE,
            tags TEXT,
            rating REAL NOT NULL DEFAULT 0,
            ds_metrics_id INTEGER UNIQUE,
            FOREIGN KEY (ds_metrics_id) REFERENCES ds_metrics(id) ON DELETE SET NULL
        );

        CREATE INDEX idx_ds_meta_data_doi ON ds_meta_data(dataset_doi);

        CREATE TABLE fm_meta_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uvl_filename TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            publication_type TEXT NOT NULL,
            publication_doi TEXT,
            tags TEXT,
            uvl_version TEXT
        );

        -- Authors hang off exactly one of the two metadata kinds
        CREATE TABLE author (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            affiliation TEXT,
            orcid TEXT,
            ds_meta_data_id INTEGER,
            fm_meta_data_id INTEGER,
            CHECK ((ds_meta_data_id IS NULL) <> (fm_meta_data_id IS NULL)),
            FOREIGN KEY (ds_meta_data_id) REFERENCES ds_meta_data(id) ON DELETE CASCADE,
            FOREIGN KEY (fm_meta_data_id) REFERENCES fm_meta_data(id) ON DELETE CASCADE
        );

        CREATE INDEX idx_author_ds ON author(ds_meta_data_id);
        CREATE INDEX idx_author_fm ON author(fm_meta_data_id);

        CREATE TABLE data_set (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            ds_meta_data_id INTEGER NOT NULL UNIQUE,
            created_at TEXT NOT NULL,
            FOREIGN KEY (ds_meta_data_id) REFERENCES ds_meta_data(id)
        );

        CREATE INDEX idx_data_set_user ON data_set(user_id);

        CREATE TABLE feature_model (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            data_set_id INTEGER NOT NULL,
            fm_meta_data_id INTEGER NOT NULL UNIQUE,
            FOREIGN KEY (data_set_id) REFERENCES data_set(id) ON DELETE CASCADE,
            FOREIGN KEY (fm_meta_data_id) REFERENCES fm_meta_data(id)
        );

        CREATE INDEX idx_feature_model_data_set ON feature_model(data_set_id);

        CREATE TABLE file (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            checksum TEXT NOT NULL,
            size INTEGER NOT NULL,
            feature_model_id INTEGER NOT NULL,
            FOREIGN KEY (feature_model_id) REFERENCES feature_model(id) ON DELETE CASCADE
        );

        CREATE INDEX idx_file_feature_model ON file(feature_model_id);
        ",
    )?;

    info!("Schema version 1 created successfully");
    Ok(())
}

/// Schema Version 2: audit trail, DOI redirects and ratings
///
/// Audit rows outlive their dataset (reference set to NULL on delete) and are
/// unique per (dataset, correlation token).
fn migrate_v2(conn: &Connection) -> Result<()> {
    debug!("Migrating to schema version 2");

    conn.execute_batch(
        "
        CREATE TABLE ds_download_record (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER,
            dataset_id INTEGER,
            download_date TEXT NOT NULL,
            download_cookie TEXT NOT NULL,
            UNIQUE(dataset_id, download_cookie),
            FOREIGN KEY (dataset_id) REFERENCES data_set(id) ON DELETE SET NULL
        );

        CREATE TABLE ds_view_record (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER,
            dataset_id INTEGER,
            view_date TEXT NOT NULL,
            view_cookie TEXT NOT NULL,
            UNIQUE(dataset_id, view_cookie),
            FOREIGN KEY (dataset_id) REFERENCES data_set(id) ON DELETE SET NULL
        );

        CREATE TABLE doi_mapping (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            dataset_doi_old TEXT NOT NULL UNIQUE,
            dataset_doi_new TEXT NOT NULL
        );

        CREATE TABLE ds_rating (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            ds_meta_data_id INTEGER NOT NULL,
            rating REAL NOT NULL CHECK (rating >= 1 AND rating <= 5),
            rated_date TEXT NOT NULL,
            UNIQUE(user_id, ds_meta_data_id),
            FOREIGN KEY (ds_meta_data_id) REFERENCES ds_meta_data(id) ON DELETE CASCADE
        );
        ",
    )?;

    info!("Schema version 2 applied successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_db() -> (NamedTempFile, Connection) {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = Connection::open(temp_file.path()).unwrap();
        (temp_file, conn)
    }

    #[test]
    fn test_schema_version_tracking() {
        let (_temp, conn) = create_test_db();
        assert_eq!(get_schema_version(&conn).unwrap(), 0);

        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let (_temp, conn) = create_test_db();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, SCHEMA_VERSION as i64);
    }

    #[test]
    fn test_all_tables_created() {
        let (_temp, conn) = create_test_db();
        migrate(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<Vec<_>>>()
            .unwrap();

        for table in [
            "author",
            "data_set",
            "doi_mapping",
            "ds_download_record",
            "ds_meta_data",
            "ds_metrics",
            "ds_rating",
            "ds_view_record",
            "feature_model",
            "file",
            "fm_meta_data",
        ] {
            assert!(tables.iter().any(|t| t == table), "missing table {table}");
        }
    }

    #[test]
    fn test_author_requires_exactly_one_owner() {
        let (_temp, conn) = create_test_db();
        migrate(&conn).unwrap();

        let neither = conn.execute("INSERT INTO author (name) VALUES ('Nobody')", []);
        assert!(neither.is_err());
    }
}
