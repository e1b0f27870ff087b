// tests/export.rs

//! Export archives read back with `zip::ZipArchive`.

mod common;

use common::{CHAT_UVL, PHONE_UVL, ingest_dataset, setup_hub};
use fmhub::Error;
use fmhub::convert::ExportFormat;
use fmhub::db::models::{Dataset, DatasetMetadata};
use fmhub::export::ExportPackager;
use std::io::{Cursor, Read};
use zip::ZipArchive;

fn entry_names(bytes: &[u8]) -> Vec<String> {
    let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut names: Vec<String> = archive.file_names().map(String::from).collect();
    names.sort();
    names
}

fn read_entry(bytes: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut content = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    content
}

fn mark_synchronized(hub: &common::TestHub, dataset_id: i64, deposition_id: i64) {
    let dataset = Dataset::get(&hub.conn, dataset_id).unwrap();
    DatasetMetadata::set_archival_identifier(
        &hub.conn,
        dataset.ds_meta_data_id,
        deposition_id,
        &format!("10.5281/zenodo.{deposition_id}"),
    )
    .unwrap();
}

#[test]
fn test_export_all_without_synchronized_datasets_is_not_found() {
    let mut hub = setup_hub();
    let packager = ExportPackager::new(hub.storage.clone());

    assert!(matches!(
        packager.export_all(&hub.conn),
        Err(Error::NotFoundError(_))
    ));

    // Stored but unpublished datasets do not count
    ingest_dataset(&mut hub, 1, &[("chat.uvl", CHAT_UVL)]);
    assert!(matches!(
        packager.export_all(&hub.conn),
        Err(Error::NotFoundError(_))
    ));
}

#[test]
fn test_export_all_writes_original_and_three_copies() {
    let mut hub = setup_hub();
    let published = ingest_dataset(&mut hub, 1, &[("chat.uvl", CHAT_UVL)]);
    let local = ingest_dataset(&mut hub, 2, &[("phone.uvl", PHONE_UVL)]);
    mark_synchronized(&hub, published, 77);

    let bytes = ExportPackager::new(hub.storage.clone())
        .export_all(&hub.conn)
        .unwrap();

    let prefix = format!("dataset_{published}");
    assert_eq!(
        entry_names(&bytes),
        vec![
            format!("{prefix}/DIMACS/chat.cnf"),
            format!("{prefix}/Glencoe/chat.json"),
            format!("{prefix}/SPLOT/chat.sxfm"),
            format!("{prefix}/UVL/chat.uvl"),
        ]
    );
    assert!(!entry_names(&bytes).iter().any(|n| n.starts_with(&format!("dataset_{local}/"))));

    assert_eq!(read_entry(&bytes, &format!("{prefix}/UVL/chat.uvl")), CHAT_UVL);
    let cnf = read_entry(&bytes, &format!("{prefix}/DIMACS/chat.cnf"));
    assert!(cnf.contains("p cnf 8 "));
    let sxfm = read_entry(&bytes, &format!("{prefix}/SPLOT/chat.sxfm"));
    assert!(sxfm.contains("<feature_model name=\"chat\">"));
}

#[test]
fn test_export_one_with_format() {
    let mut hub = setup_hub();
    let id = ingest_dataset(&mut hub, 1, &[("chat.uvl", CHAT_UVL), ("phone.uvl", PHONE_UVL)]);

    let bytes = ExportPackager::new(hub.storage.clone())
        .export_one(&hub.conn, id, ExportFormat::Xml)
        .unwrap();

    let prefix = format!("dataset_{id}");
    assert_eq!(
        entry_names(&bytes),
        vec![
            format!("{prefix}/chat.uvl"),
            format!("{prefix}/chat.xml"),
            format!("{prefix}/phone.uvl"),
            format!("{prefix}/phone.xml"),
        ]
    );
    let xml = read_entry(&bytes, &format!("{prefix}/phone.xml"));
    assert!(xml.contains("<item name=\"Phone\">"));
}

#[test]
fn test_failed_conversion_is_skipped() {
    let broken = "features\n    Root\n        optional\n            A\nconstraints\n    A => B => C\n";
    let mut hub = setup_hub();
    let id = ingest_dataset(&mut hub, 1, &[("broken.uvl", broken), ("chat.uvl", CHAT_UVL)]);

    let bytes = ExportPackager::new(hub.storage.clone())
        .export_one(&hub.conn, id, ExportFormat::Json)
        .unwrap();

    let prefix = format!("dataset_{id}");
    assert_eq!(
        entry_names(&bytes),
        vec![
            format!("{prefix}/broken.uvl"),
            format!("{prefix}/chat.json"),
            format!("{prefix}/chat.uvl"),
        ]
    );
}

#[test]
fn test_export_unknown_dataset() {
    let hub = setup_hub();
    let packager = ExportPackager::new(hub.storage.clone());

    assert!(matches!(
        packager.export_one(&hub.conn, 41, ExportFormat::Yaml),
        Err(Error::NotFoundError(_))
    ));
}
