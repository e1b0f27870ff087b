// src/db/models/doi_redirect.rs

//! Retired archival DOIs and their replacements
//!
//! A lookup by DOI consults this table first; a hit tells the caller to
//! retry with the replacement instead of serving the old record.

use super::{Dataset, DatasetMetadata};
use crate::error::{Error, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};

/// Longest redirect chain followed before giving up
const MAX_DEPTH: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoiRedirect {
    pub id: Option<i64>,
    pub old_doi: String,
    pub new_doi: String,
}

/// Result of looking a dataset up by archival DOI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DoiLookup {
    /// The DOI was retired; retry with this one
    Redirect(String),
    Found(Dataset),
}

impl DoiRedirect {
    pub fn new(old_doi: impl Into<String>, new_doi: impl Into<String>) -> Self {
        Self {
            id: None,
            old_doi: old_doi.into(),
            new_doi: new_doi.into(),
        }
    }

    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO doi_mapping (dataset_doi_old, dataset_doi_new) VALUES (?1, ?2)",
            params![&self.old_doi, &self.new_doi],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    pub fn find_by_old(conn: &Connection, old_doi: &str) -> Result<Option<Self>> {
        let redirect = conn
            .query_row(
                "SELECT id, dataset_doi_old, dataset_doi_new FROM doi_mapping
                 WHERE dataset_doi_old = ?1",
                [old_doi],
                Self::from_row,
            )
            .optional()?;
        Ok(redirect)
    }

    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, dataset_doi_old, dataset_doi_new FROM doi_mapping ORDER BY dataset_doi_old",
        )?;
        let redirects = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(redirects)
    }

    /// Follow the redirect chain from `doi` to its final replacement
    ///
    /// Returns `None` when `doi` is not redirected at all.
    pub fn resolve(conn: &Connection, doi: &str) -> Result<Option<String>> {
        let mut chain = vec![doi.to_string()];

        for _ in 0..MAX_DEPTH {
            let Some(current) = chain.last() else { break };
            let Some(redirect) = Self::find_by_old(conn, current)? else {
                break;
            };
            if chain.contains(&redirect.new_doi) {
                return Err(Error::DatabaseError(format!(
                    "Circular DOI redirect: {} -> {}",
                    redirect.old_doi, redirect.new_doi
                )));
            }
            chain.push(redirect.new_doi);
        }

        if chain.len() > 1 {
            Ok(chain.pop())
        } else {
            Ok(None)
        }
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            old_doi: row.get(1)?,
            new_doi: row.get(2)?,
        })
    }
}

/// Find a dataset by archival DOI, redirects first
pub fn lookup_by_doi(conn: &Connection, doi: &str) -> Result<DoiLookup> {
    if let Some(new_doi) = DoiRedirect::resolve(conn, doi)? {
        return Ok(DoiLookup::Redirect(new_doi));
    }

    let metadata = DatasetMetadata::find_by_doi(conn, doi)?
        .ok_or_else(|| Error::NotFoundError(format!("No dataset with DOI {doi}")))?;
    let metadata_id = metadata.id.unwrap_or_default();
    let dataset = Dataset::find_by_metadata(conn, metadata_id)?
        .ok_or_else(|| Error::NotFoundError(format!("No dataset with DOI {doi}")))?;

    Ok(DoiLookup::Found(dataset))
}
