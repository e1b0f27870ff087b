// src/db/models/metrics.rs

//! Dataset-level counts (`ds_metrics`)

use crate::error::Result;
use crate::uvl::ModelMetrics;
use rusqlite::{Connection, OptionalExtension, Row, params};

/// Counts accumulated over every feature model of a dataset
///
/// Written once at ingestion and never updated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasetMetrics {
    pub id: Option<i64>,
    pub number_of_models: i64,
    pub number_of_features: i64,
    pub number_of_products: i64,
}

/// Running totals while files are processed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsTotals {
    pub models: u64,
    pub features: u64,
    pub products: u64,
}

impl MetricsTotals {
    pub fn add(&mut self, metrics: ModelMetrics) {
        self.models += 1;
        self.features = self.features.saturating_add(metrics.feature_count);
        self.products = self.products.saturating_add(metrics.product_count);
    }
}

fn clamp(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl DatasetMetrics {
    /// Build a row from totals; values beyond `i64::MAX` are clamped
    pub fn from_totals(totals: MetricsTotals) -> Self {
        Self {
            id: None,
            number_of_models: clamp(totals.models),
            number_of_features: clamp(totals.features),
            number_of_products: clamp(totals.products),
        }
    }

    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO ds_metrics (number_of_models, number_of_features, number_of_products)
             VALUES (?1, ?2, ?3)",
            params![
                self.number_of_models,
                self.number_of_features,
                self.number_of_products
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let metrics = conn
            .query_row(
                "SELECT id, number_of_models, number_of_features, number_of_products
                 FROM ds_metrics WHERE id = ?1",
                [id],
                Self::from_row,
            )
            .optional()?;
        Ok(metrics)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            number_of_models: row.get(1)?,
            number_of_features: row.get(2)?,
            number_of_products: row.get(3)?,
        })
    }
}
