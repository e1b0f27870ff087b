// src/audit.rs

//! Download and view tracking keyed by client correlation token
//!
//! A client without a token gets a fresh UUIDv4 and is expected to send it
//! back on later requests. Repeated events carrying the same token for the
//! same dataset are recorded once.

use crate::db::models::{AuditEvent, Dataset, EventKind};
use crate::error::Result;
use rusqlite::Connection;
use tracing::debug;
use uuid::Uuid;

/// Outcome of recording an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReceipt {
    /// Token to hand back to the client
    pub token: String,
    /// False when the token had already been recorded for this dataset
    pub created: bool,
}

/// Record a download of `dataset_id`
pub fn record_download(
    conn: &Connection,
    dataset_id: i64,
    user_id: Option<i64>,
    token: Option<&str>,
) -> Result<AuditReceipt> {
    record(conn, EventKind::Download, dataset_id, user_id, token)
}

/// Record a view of `dataset_id`
pub fn record_view(
    conn: &Connection,
    dataset_id: i64,
    user_id: Option<i64>,
    token: Option<&str>,
) -> Result<AuditReceipt> {
    record(conn, EventKind::View, dataset_id, user_id, token)
}

pub fn download_count(conn: &Connection, dataset_id: i64) -> Result<i64> {
    AuditEvent::count_for_dataset(conn, EventKind::Download, dataset_id)
}

pub fn view_count(conn: &Connection, dataset_id: i64) -> Result<i64> {
    AuditEvent::count_for_dataset(conn, EventKind::View, dataset_id)
}

fn record(
    conn: &Connection,
    kind: EventKind,
    dataset_id: i64,
    user_id: Option<i64>,
    token: Option<&str>,
) -> Result<AuditReceipt> {
    // Surface unknown datasets as NotFound rather than a foreign key failure
    Dataset::get(conn, dataset_id)?;

    let token = match token {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => Uuid::new_v4().to_string(),
    };

    let mut event = AuditEvent::new(kind, dataset_id, user_id, token.clone());
    let created = event.insert_or_ignore(conn)?;
    debug!(
        "{} of dataset {} with token {} ({})",
        kind,
        dataset_id,
        token,
        if created { "recorded" } else { "duplicate" }
    );

    Ok(AuditReceipt { token, created })
}
