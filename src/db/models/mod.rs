// src/db/models/mod.rs

//! Data models for fmhub database entities
//!
//! This module defines Rust structs that correspond to database tables
//! and provides methods for creating, reading, updating, and deleting records.

mod audit_event;
mod author;
mod dataset;
mod doi_redirect;
mod feature_model;
mod file_record;
mod metadata;
mod metrics;
mod rating;

pub use audit_event::{AuditEvent, EventKind};
pub use author::{Author, AuthorOwner};
pub use dataset::{Dataset, DatasetDetail, human_size};
pub use doi_redirect::{DoiLookup, DoiRedirect, lookup_by_doi};
pub use feature_model::{FeatureModel, FeatureModelDetail, FeatureModelMetadata};
pub use file_record::FileRecord;
pub use metadata::{DatasetMetadata, PublicationType, split_tags};
pub use metrics::{DatasetMetrics, MetricsTotals};
pub use rating::Rating;
