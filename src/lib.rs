// src/lib.rs

//! fmhub: a hub for feature-model datasets
//!
//! Users upload UVL feature models, describe them, and the hub stores them
//! as datasets with derived metrics, publishes them to an archival service
//! for a DOI, and exports them in other formats.
//!
//! # Architecture
//!
//! - Local first: a dataset is created in one SQLite transaction; remote
//!   publication happens afterwards and never undoes it
//! - Staging: uploads wait in a per-user staging folder until ingestion
//!   moves them to `uploads/user_<u>/dataset_<d>/`
//! - Tolerant parsing: UVL content is scanned line by line and never
//!   rejected for its syntax
//! - Checksums on every stored file, MD5 by default

pub mod audit;
pub mod config;
pub mod convert;
pub mod db;
mod error;
pub mod export;
pub mod hash;
pub mod ingest;
pub mod integrity;
pub mod storage;
pub mod sync;
pub mod uvl;

pub use error::{Error, ErrorKind, Result};
pub use hash::{HashAlgorithm, Hasher};
