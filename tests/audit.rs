// tests/audit.rs

//! Download and view bookkeeping, DOI lookup and ratings on ingested datasets.

mod common;

use common::{CHAT_UVL, ingest_dataset, setup_hub};
use fmhub::Error;
use fmhub::audit;
use fmhub::db::models::{
    AuditEvent, Dataset, DatasetMetadata, DoiLookup, DoiRedirect, EventKind, Rating,
    lookup_by_doi,
};

#[test]
fn test_repeated_download_with_same_token_counts_once() {
    let mut hub = setup_hub();
    let id = ingest_dataset(&mut hub, 1, &[("chat.uvl", CHAT_UVL)]);

    let first = audit::record_download(&hub.conn, id, Some(9), Some("cookie-1")).unwrap();
    let second = audit::record_download(&hub.conn, id, Some(9), Some("cookie-1")).unwrap();
    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.token, second.token);
    assert_eq!(audit::download_count(&hub.conn, id).unwrap(), 1);

    // Fresh tokens are generated when none is supplied
    let anonymous = audit::record_download(&hub.conn, id, None, None).unwrap();
    assert!(anonymous.created);
    assert_ne!(anonymous.token, "cookie-1");
    assert_eq!(audit::download_count(&hub.conn, id).unwrap(), 2);

    // Views are tracked separately
    audit::record_view(&hub.conn, id, None, Some("cookie-1")).unwrap();
    assert_eq!(audit::view_count(&hub.conn, id).unwrap(), 1);
    assert_eq!(AuditEvent::total(&hub.conn, EventKind::Download).unwrap(), 2);
}

#[test]
fn test_same_token_on_two_datasets_counts_twice() {
    let mut hub = setup_hub();
    let a = ingest_dataset(&mut hub, 1, &[("chat.uvl", CHAT_UVL)]);
    let b = ingest_dataset(&mut hub, 1, &[("chat.uvl", CHAT_UVL)]);

    assert!(audit::record_view(&hub.conn, a, None, Some("t")).unwrap().created);
    assert!(audit::record_view(&hub.conn, b, None, Some("t")).unwrap().created);
}

#[test]
fn test_audit_of_unknown_dataset() {
    let hub = setup_hub();
    assert!(matches!(
        audit::record_download(&hub.conn, 12, None, None),
        Err(Error::NotFoundError(_))
    ));
}

#[test]
fn test_doi_redirect_points_to_new_dataset() {
    let mut hub = setup_hub();
    let id = ingest_dataset(&mut hub, 1, &[("chat.uvl", CHAT_UVL)]);
    let dataset = Dataset::get(&hub.conn, id).unwrap();
    DatasetMetadata::set_archival_identifier(&hub.conn, dataset.ds_meta_data_id, 5, "10.5281/zenodo.5")
        .unwrap();
    DoiRedirect::new("10.5281/zenodo.1", "10.5281/zenodo.5")
        .insert(&hub.conn)
        .unwrap();

    match lookup_by_doi(&hub.conn, "10.5281/zenodo.1").unwrap() {
        DoiLookup::Redirect(doi) => assert_eq!(doi, "10.5281/zenodo.5"),
        other => panic!("expected redirect, got {other:?}"),
    }
    match lookup_by_doi(&hub.conn, "10.5281/zenodo.5").unwrap() {
        DoiLookup::Found(found) => assert_eq!(found.id, Some(id)),
        other => panic!("expected dataset, got {other:?}"),
    }
    assert!(matches!(
        lookup_by_doi(&hub.conn, "10.5281/zenodo.404"),
        Err(Error::NotFoundError(_))
    ));
}

#[test]
fn test_ratings_update_average() {
    let mut hub = setup_hub();
    let id = ingest_dataset(&mut hub, 1, &[("chat.uvl", CHAT_UVL)]);
    let md_id = Dataset::get(&hub.conn, id).unwrap().ds_meta_data_id;

    Rating::upsert(&hub.conn, md_id, 1, 5).unwrap();
    Rating::upsert(&hub.conn, md_id, 2, 2).unwrap();
    // A user's second vote replaces the first
    Rating::upsert(&hub.conn, md_id, 2, 4).unwrap();

    assert_eq!(Rating::count(&hub.conn, md_id).unwrap(), 2);
    let metadata = DatasetMetadata::find_by_id(&hub.conn, md_id).unwrap().unwrap();
    assert!((metadata.rating - 4.5).abs() < f64::EPSILON);
}
