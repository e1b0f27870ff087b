// tests/sync.rs

//! Synchronization against a scripted archival service.

mod common;

use common::{CHAT_UVL, PHONE_UVL, ingest_dataset, setup_hub};
use fmhub::db::models::{Dataset, DatasetMetadata, DatasetMetrics, FeatureModel, FileRecord};
use fmhub::sync::{
    ArchivalService, Deposition, DepositionMetadata, SyncOutcome, SyncStep,
    SynchronizationCoordinator,
};
use fmhub::{Error, Result};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// Archive fake that logs every call and fails at a chosen step
#[derive(Clone, Default)]
struct ScriptedArchive {
    calls: Rc<RefCell<Vec<String>>>,
    fail_at: Option<&'static str>,
}

impl ScriptedArchive {
    fn failing_at(step: &'static str) -> Self {
        Self {
            fail_at: Some(step),
            ..Default::default()
        }
    }

    fn call(&self, name: &str) -> Result<()> {
        self.calls.borrow_mut().push(name.to_string());
        if self.fail_at == Some(name) {
            return Err(Error::ExternalServiceError(format!("{name} rejected")));
        }
        Ok(())
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl ArchivalService for ScriptedArchive {
    fn create_deposition(&self, metadata: &DepositionMetadata) -> Result<Deposition> {
        assert_eq!(metadata.upload_type, "publication");
        self.call("create")?;
        Ok(Deposition {
            id: 4242,
            concept_record_id: "4241".to_string(),
        })
    }

    fn upload_file(&self, deposition_id: i64, name: &str, path: &Path) -> Result<()> {
        assert_eq!(deposition_id, 4242);
        assert!(path.is_file(), "{} is not stored", path.display());
        self.call(&format!("upload {name}"))
    }

    fn publish(&self, _: i64) -> Result<()> {
        self.call("publish")
    }

    fn fetch_doi(&self, deposition_id: i64) -> Result<String> {
        self.call("doi")?;
        Ok(format!("10.5281/zenodo.{deposition_id}"))
    }
}

fn coordinator(archive: &ScriptedArchive, hub: &common::TestHub) -> SynchronizationCoordinator {
    SynchronizationCoordinator::new(Box::new(archive.clone()), hub.storage.clone())
}

#[test]
fn test_full_synchronization_records_doi() {
    let mut hub = setup_hub();
    let id = ingest_dataset(&mut hub, 1, &[("chat.uvl", CHAT_UVL), ("phone.uvl", PHONE_UVL)]);
    let archive = ScriptedArchive::default();

    let outcome = coordinator(&archive, &hub).synchronize(&hub.conn, id).unwrap();

    assert_eq!(
        outcome,
        SyncOutcome::Synchronized {
            deposition_id: 4242,
            doi: "10.5281/zenodo.4242".to_string()
        }
    );
    assert_eq!(
        archive.calls(),
        vec!["create", "upload chat.uvl", "upload phone.uvl", "publish", "doi"]
    );
    assert!(Dataset::is_synchronized(&hub.conn, id).unwrap());

    let dataset = Dataset::get(&hub.conn, id).unwrap();
    let metadata = DatasetMetadata::find_by_id(&hub.conn, dataset.ds_meta_data_id)
        .unwrap()
        .unwrap();
    assert_eq!(metadata.deposition_id, Some(4242));

    // A second run does not contact the service again
    let again = coordinator(&archive, &hub).synchronize(&hub.conn, id).unwrap();
    assert!(again.is_synchronized());
    assert_eq!(archive.calls().len(), 5);
}

/// Everything `ingest` committed for one dataset
#[derive(Debug, PartialEq)]
struct CommittedState {
    dataset: Dataset,
    metadata: DatasetMetadata,
    metrics: Option<DatasetMetrics>,
    feature_models: Vec<FeatureModel>,
    files: Vec<FileRecord>,
}

fn committed_state(conn: &rusqlite::Connection, dataset_id: i64) -> CommittedState {
    let dataset = Dataset::get(conn, dataset_id).unwrap();
    let metadata = DatasetMetadata::find_by_id(conn, dataset.ds_meta_data_id)
        .unwrap()
        .unwrap();
    let metrics = metadata
        .ds_metrics_id
        .map(|id| DatasetMetrics::find_by_id(conn, id).unwrap().unwrap());
    CommittedState {
        feature_models: FeatureModel::find_by_dataset(conn, dataset_id).unwrap(),
        files: FileRecord::find_by_dataset(conn, dataset_id).unwrap(),
        dataset,
        metadata,
        metrics,
    }
}

#[test]
fn test_publish_failure_leaves_dataset_local() {
    let mut hub = setup_hub();
    let id = ingest_dataset(&mut hub, 1, &[("chat.uvl", CHAT_UVL), ("phone.uvl", PHONE_UVL)]);
    let before = committed_state(&hub.conn, id);
    assert_eq!(before.feature_models.len(), 2);
    assert_eq!(before.files.len(), 2);
    assert!(before.metrics.is_some());
    let archive = ScriptedArchive::failing_at("publish");

    let outcome = coordinator(&archive, &hub).synchronize(&hub.conn, id).unwrap();

    match outcome {
        SyncOutcome::Incomplete {
            deposition_id,
            step,
            reason,
        } => {
            assert_eq!(deposition_id, 4242);
            assert_eq!(step, SyncStep::Publish);
            assert!(reason.contains("publish rejected"));
        }
        other => panic!("expected incomplete outcome, got {other:?}"),
    }

    // Every committed row is untouched, including feature models and files
    assert_eq!(committed_state(&hub.conn, id), before);
    assert!(!Dataset::is_synchronized(&hub.conn, id).unwrap());
    assert_eq!(before.metadata.deposition_id, None);
    assert_eq!(before.metadata.dataset_doi, None);
    assert!(hub.storage.dataset_dir(1, id).join("chat.uvl").is_file());
    assert!(hub.storage.dataset_dir(1, id).join("phone.uvl").is_file());
}

#[test]
fn test_create_failure_is_local_only() {
    let mut hub = setup_hub();
    let id = ingest_dataset(&mut hub, 1, &[("chat.uvl", CHAT_UVL)]);
    let archive = ScriptedArchive::failing_at("create");

    let outcome = coordinator(&archive, &hub).synchronize(&hub.conn, id).unwrap();

    assert!(matches!(outcome, SyncOutcome::LocalOnly { .. }));
    assert_eq!(outcome.doi(), None);
    assert_eq!(archive.calls(), vec!["create"]);
}

#[test]
fn test_upload_failure_stops_before_publish() {
    let mut hub = setup_hub();
    let id = ingest_dataset(&mut hub, 1, &[("chat.uvl", CHAT_UVL)]);
    let archive = ScriptedArchive::failing_at("upload chat.uvl");

    let outcome = coordinator(&archive, &hub).synchronize(&hub.conn, id).unwrap();

    assert!(matches!(
        outcome,
        SyncOutcome::Incomplete {
            step: SyncStep::Upload,
            ..
        }
    ));
    assert!(!archive.calls().contains(&"publish".to_string()));
}
