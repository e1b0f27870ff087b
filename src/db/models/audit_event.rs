// src/db/models/audit_event.rs

//! Download and view audit rows
//!
//! Both kinds share one shape and live in separate tables. Rows are unique
//! per (dataset, correlation token) and survive dataset deletion.

use crate::error::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Download,
    View,
}

impl EventKind {
    fn table(&self) -> &'static str {
        match self {
            EventKind::Download => "ds_download_record",
            EventKind::View => "ds_view_record",
        }
    }

    fn date_column(&self) -> &'static str {
        match self {
            EventKind::Download => "download_date",
            EventKind::View => "view_date",
        }
    }

    fn token_column(&self) -> &'static str {
        match self {
            EventKind::Download => "download_cookie",
            EventKind::View => "view_cookie",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Download => "download",
            EventKind::View => "view",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub id: Option<i64>,
    pub kind: EventKind,
    /// `None` for anonymous visitors
    pub user_id: Option<i64>,
    /// `None` once the dataset has been deleted
    pub dataset_id: Option<i64>,
    pub date: String,
    /// Client correlation token (cookie value)
    pub token: String,
}

impl AuditEvent {
    pub fn new(kind: EventKind, dataset_id: i64, user_id: Option<i64>, token: String) -> Self {
        Self {
            id: None,
            kind,
            user_id,
            dataset_id: Some(dataset_id),
            date: Utc::now().to_rfc3339(),
            token,
        }
    }

    /// Insert unless a row with the same dataset and token exists
    ///
    /// Returns whether a new row was written.
    pub fn insert_or_ignore(&mut self, conn: &Connection) -> Result<bool> {
        let sql = format!(
            "INSERT OR IGNORE INTO {} (user_id, dataset_id, {}, {}) VALUES (?1, ?2, ?3, ?4)",
            self.kind.table(),
            self.kind.date_column(),
            self.kind.token_column()
        );
        let inserted = conn.execute(
            &sql,
            params![&self.user_id, &self.dataset_id, &self.date, &self.token],
        )?;

        if inserted == 0 {
            return Ok(false);
        }
        self.id = Some(conn.last_insert_rowid());
        Ok(true)
    }

    pub fn find_by_token(
        conn: &Connection,
        kind: EventKind,
        dataset_id: i64,
        token: &str,
    ) -> Result<Option<Self>> {
        let sql = format!(
            "SELECT id, user_id, dataset_id, {}, {} FROM {} WHERE dataset_id = ?1 AND {} = ?2",
            kind.date_column(),
            kind.token_column(),
            kind.table(),
            kind.token_column()
        );
        let event = conn
            .query_row(&sql, params![dataset_id, token], |row| {
                Self::from_row(row, kind)
            })
            .optional()?;
        Ok(event)
    }

    pub fn count_for_dataset(conn: &Connection, kind: EventKind, dataset_id: i64) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE dataset_id = ?1", kind.table());
        let count = conn.query_row(&sql, [dataset_id], |row| row.get(0))?;
        Ok(count)
    }

    /// Rows of this kind across all datasets, deleted ones included
    pub fn total(conn: &Connection, kind: EventKind) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
        let count = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count)
    }

    fn from_row(row: &Row, kind: EventKind) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            kind,
            user_id: row.get(1)?,
            dataset_id: row.get(2)?,
            date: row.get(3)?,
            token: row.get(4)?,
        })
    }
}
