// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use fmhub::HashAlgorithm;
use fmhub::db;
use fmhub::db::models::PublicationType;
use fmhub::ingest::{
    AuthorInput, DatasetAssembler, DatasetFields, FeatureModelInput, IngestRequest, UserProfile,
};
use fmhub::integrity::FileIntegrity;
use fmhub::storage::UploadStorage;
use rusqlite::Connection;
use tempfile::TempDir;

/// Chat model: 8 features; the flat scan puts Messages in the alternative
/// group, so 2^1 * 3 * (2^2 - 1) = 18 products
pub const CHAT_UVL: &str = r#"features
    Chat
        mandatory
            Connection
                alternative
                    "Peer 2 Peer"
                    Server
            Messages
                or
                    Text
                    Video
        optional
            "Data Storage"

constraints
    Server => "Data Storage"
"#;

/// 6 features, 2^3 * 1 * (2^2 - 1) = 24 products
pub const PHONE_UVL: &str = "features\n    Phone\n        optional\n            Camera\n            GPS\n            Radio\n        or\n            Calls\n            SMS\n";

/// A storage root and database in a temporary directory.
///
/// Keep the struct alive to prevent cleanup.
pub struct TestHub {
    pub dir: TempDir,
    pub db_path: String,
    pub storage: UploadStorage,
    pub conn: Connection,
}

pub fn setup_hub() -> TestHub {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("fmhub.db").to_str().unwrap().to_string();

    db::init(&db_path).unwrap();
    let conn = db::open(&db_path).unwrap();
    let storage = UploadStorage::new(dir.path());

    TestHub {
        dir,
        db_path,
        storage,
        conn,
    }
}

pub fn user(id: i64) -> UserProfile {
    UserProfile {
        id,
        name: "Jane".to_string(),
        surname: "Doe".to_string(),
        affiliation: Some("University of Seville".to_string()),
        orcid: None,
    }
}

/// A valid request covering `filenames`, one feature model each
pub fn request(filenames: &[&str]) -> IngestRequest {
    IngestRequest {
        dataset: DatasetFields {
            title: "Messaging product lines".to_string(),
            description: "Feature models of chat and phone systems".to_string(),
            publication_type: Some(PublicationType::Article),
            publication_doi: None,
            tags: Some("chat, phone".to_string()),
        },
        authors: vec![AuthorInput {
            name: "Roe, Richard".to_string(),
            affiliation: None,
            orcid: Some("0000-0002-1825-0097".to_string()),
        }],
        feature_models: filenames
            .iter()
            .map(|name| FeatureModelInput {
                uvl_filename: name.to_string(),
                title: format!("Model {name}"),
                description: "A feature model".to_string(),
                publication_type: Some(PublicationType::None),
                ..Default::default()
            })
            .collect(),
    }
}

pub fn assembler(storage: &UploadStorage) -> DatasetAssembler {
    DatasetAssembler::new(storage.clone(), FileIntegrity::new(HashAlgorithm::Md5))
}

/// Stage `files` for `user_id` and ingest them as one dataset
pub fn ingest_dataset(hub: &mut TestHub, user_id: i64, files: &[(&str, &str)]) -> i64 {
    for (name, content) in files {
        hub.storage
            .stage_upload(user_id, name, content.as_bytes())
            .unwrap();
    }
    let names: Vec<&str> = files.iter().map(|(name, _)| *name).collect();

    let dataset = assembler(&hub.storage)
        .ingest(&mut hub.conn, &request(&names), &user(user_id))
        .unwrap();
    dataset.id.unwrap()
}

/// Row count of `table`
pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}
