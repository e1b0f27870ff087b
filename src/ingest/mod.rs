// src/ingest/mod.rs

//! Dataset ingestion: typed request payloads and the atomic assembler

mod assembler;
pub mod request;

pub use assembler::DatasetAssembler;
pub use request::{AuthorInput, DatasetFields, FeatureModelInput, IngestRequest, UserProfile};
