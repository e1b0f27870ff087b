// src/error.rs

//! Error types for fmhub
//!
//! Every fallible library operation returns [`Result`]. Variants follow the
//! failure taxonomy of the ingestion pipeline: see [`ErrorKind`] for the
//! coarse classification callers use to decide how to surface a failure.

use thiserror::Error;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum Error {
    /// A required ingestion field is missing or invalid
    #[error("Validation error in '{field}': {message}")]
    ValidationError { field: String, message: String },

    /// A staged or stored file could not be read or written
    #[error("I/O error: {0}")]
    IoError(String),

    /// Input could not be interpreted (config file, request file, timestamps)
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The storage layer rejected a read or write
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// The archival service was unreachable, rejected a request or answered garbage
    #[error("Archival service error: {0}")]
    ExternalServiceError(String),

    /// A single file could not be converted to a target format
    #[error("Conversion error: {0}")]
    ConversionError(String),

    /// A dataset was committed but its staged files could not be moved to
    /// permanent storage; the staged copies are kept
    #[error("Dataset {dataset_id} committed but its files were not relocated: {message}")]
    PromotionError { dataset_id: i64, message: String },

    /// Requested dataset (or any dataset at all) does not exist
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Writing an export archive failed
    #[error("Archive error: {0}")]
    ArchiveError(String),

    /// Configuration file is malformed
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A component could not be constructed
    #[error("Initialization error: {0}")]
    InitError(String),
}

/// Result type alias for fmhub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse failure classification used when reporting to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    ParseOrIo,
    Persistence,
    ExternalService,
    Conversion,
    NotFound,
    Internal,
}

impl Error {
    /// Shorthand for a field-level validation failure
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ValidationError { .. } => ErrorKind::Validation,
            Error::IoError(_) | Error::ParseError(_) | Error::PromotionError { .. } => {
                ErrorKind::ParseOrIo
            }
            Error::DatabaseError(_) => ErrorKind::Persistence,
            Error::ExternalServiceError(_) => ErrorKind::ExternalService,
            Error::ConversionError(_) => ErrorKind::Conversion,
            Error::NotFoundError(_) => ErrorKind::NotFound,
            Error::ArchiveError(_) | Error::ConfigError(_) | Error::InitError(_) => {
                ErrorKind::Internal
            }
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::DatabaseError(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ArchiveError(err.to_string())
    }
}
