// src/db/models/rating.rs

//! Per-user dataset ratings (`ds_rating`)

use super::DatasetMetadata;
use crate::error::{Error, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct Rating {
    pub id: Option<i64>,
    pub user_id: i64,
    pub ds_meta_data_id: i64,
    pub rating: f64,
    pub rated_date: String,
}

impl Rating {
    /// Rate a dataset, replacing the user's previous rating if any
    ///
    /// Also refreshes the derived average stored on the metadata row.
    pub fn upsert(conn: &Connection, ds_meta_data_id: i64, user_id: i64, value: u8) -> Result<Self> {
        if !(1..=5).contains(&value) {
            return Err(Error::validation(
                "rating",
                format!("must be between 1 and 5, got {value}"),
            ));
        }
        if DatasetMetadata::find_by_id(conn, ds_meta_data_id)?.is_none() {
            return Err(Error::NotFoundError(format!(
                "Dataset metadata {ds_meta_data_id}"
            )));
        }

        conn.execute(
            "INSERT INTO ds_rating (user_id, ds_meta_data_id, rating, rated_date)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id, ds_meta_data_id)
             DO UPDATE SET rating = excluded.rating, rated_date = excluded.rated_date",
            params![user_id, ds_meta_data_id, f64::from(value), Utc::now().to_rfc3339()],
        )?;

        let average = Self::average(conn, ds_meta_data_id)?;
        conn.execute(
            "UPDATE ds_meta_data SET rating = ?1 WHERE id = ?2",
            params![average, ds_meta_data_id],
        )?;
        debug!(
            "User {} rated metadata {} with {} (average {:.2})",
            user_id, ds_meta_data_id, value, average
        );

        Self::find(conn, ds_meta_data_id, user_id)?.ok_or_else(|| {
            Error::DatabaseError(format!(
                "Rating by user {user_id} on metadata {ds_meta_data_id} vanished after write"
            ))
        })
    }

    pub fn find(conn: &Connection, ds_meta_data_id: i64, user_id: i64) -> Result<Option<Self>> {
        let rating = conn
            .query_row(
                "SELECT id, user_id, ds_meta_data_id, rating, rated_date FROM ds_rating
                 WHERE ds_meta_data_id = ?1 AND user_id = ?2",
                params![ds_meta_data_id, user_id],
                Self::from_row,
            )
            .optional()?;
        Ok(rating)
    }

    /// Average rating, 0 when nobody rated yet
    pub fn average(conn: &Connection, ds_meta_data_id: i64) -> Result<f64> {
        let average: Option<f64> = conn.query_row(
            "SELECT AVG(rating) FROM ds_rating WHERE ds_meta_data_id = ?1",
            [ds_meta_data_id],
            |row| row.get(0),
        )?;
        Ok(average.unwrap_or(0.0))
    }

    pub fn count(conn: &Connection, ds_meta_data_id: i64) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM ds_rating WHERE ds_meta_data_id = ?1",
            [ds_meta_data_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            user_id: row.get(1)?,
            ds_meta_data_id: row.get(2)?,
            rating: row.get(3)?,
            rated_date: row.get(4)?,
        })
    }
}
