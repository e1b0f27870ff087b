// src/sync/mod.rs

//! Synchronization of datasets with an external archival service

pub mod archive;
mod coordinator;
pub mod zenodo;

pub use archive::{ArchivalService, Creator, Deposition, DepositionMetadata};
pub use coordinator::{SyncOutcome, SyncStep, SynchronizationCoordinator};
pub use zenodo::ZenodoClient;
