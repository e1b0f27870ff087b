// src/ingest/request.rs

//! Typed ingestion payload
//!
//! ```toml
//! [dataset]
//! title = "Chat product lines"
//! description = "Feature models of messaging apps"
//! publication_type = "article"
//! tags = "chat, messaging"
//!
//! [[authors]]
//! name = "Roe, Richard"
//! affiliation = "University of Somewhere"
//!
//! [[feature_models]]
//! uvl_filename = "chat.uvl"
//! title = "Chat"
//! description = "Basic chat"
//! uvl_version = "1.0"
//! ```

use crate::db::models::PublicationType;
use crate::error::{Error, Result};
use crate::uvl;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Dataset-level form fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetFields {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub publication_type: Option<PublicationType>,
    #[serde(default)]
    pub publication_doi: Option<String>,
    /// Comma-separated
    #[serde(default)]
    pub tags: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub affiliation: Option<String>,
    #[serde(default)]
    pub orcid: Option<String>,
}

/// Per-file form fields; `uvl_filename` names a file in the staging folder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureModelInput {
    pub uvl_filename: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub publication_type: Option<PublicationType>,
    #[serde(default)]
    pub publication_doi: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub uvl_version: Option<String>,
    #[serde(default)]
    pub authors: Vec<AuthorInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestRequest {
    pub dataset: DatasetFields,
    #[serde(default)]
    pub authors: Vec<AuthorInput>,
    #[serde(default)]
    pub feature_models: Vec<FeatureModelInput>,
}

/// The submitting user; becomes the first dataset author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub surname: String,
    #[serde(default)]
    pub affiliation: Option<String>,
    #[serde(default)]
    pub orcid: Option<String>,
}

impl UserProfile {
    /// Author name in `"<surname>, <name>"` form
    pub fn author_name(&self) -> String {
        format!("{}, {}", self.surname, self.name)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ParseError(format!("user profile: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_toml_str(&read(path)?)
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| Error::IoError(format!("Failed to read {}: {e}", path.display())))
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

impl IngestRequest {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ParseError(format!("ingest request: {e}")))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::ParseError(format!("ingest request: {e}")))
    }

    /// Load a request file; `.json` files are JSON, everything else TOML
    pub fn load(path: &Path) -> Result<Self> {
        let content = read(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Staged filenames in submission order
    pub fn filenames(&self) -> Vec<String> {
        self.feature_models
            .iter()
            .map(|fm| fm.uvl_filename.clone())
            .collect()
    }

    /// Check required fields, failing on the first problem
    pub fn validate(&self) -> Result<()> {
        if blank(&self.dataset.title) {
            return Err(Error::validation("dataset.title", "is required"));
        }
        if blank(&self.dataset.description) {
            return Err(Error::validation("dataset.description", "is required"));
        }
        if self.dataset.publication_type.is_none() {
            return Err(Error::validation("dataset.publication_type", "is required"));
        }
        validate_authors("authors", &self.authors)?;

        if self.feature_models.is_empty() {
            return Err(Error::validation(
                "feature_models",
                "at least one feature model is required",
            ));
        }

        for (i, fm) in self.feature_models.iter().enumerate() {
            if !uvl::has_uvl_extension(&fm.uvl_filename) {
                return Err(Error::validation(
                    format!("feature_models[{i}].uvl_filename"),
                    format!(
                        "'{}' does not end in .{}",
                        fm.uvl_filename,
                        uvl::UVL_EXTENSION
                    ),
                ));
            }
            if blank(&fm.title) {
                return Err(Error::validation(
                    format!("feature_models[{i}].title"),
                    "is required",
                ));
            }
            if blank(&fm.description) {
                return Err(Error::validation(
                    format!("feature_models[{i}].description"),
                    "is required",
                ));
            }
            validate_authors(&format!("feature_models[{i}].authors"), &fm.authors)?;
        }

        let mut seen = std::collections::HashSet::new();
        for (i, fm) in self.feature_models.iter().enumerate() {
            if !seen.insert(fm.uvl_filename.as_str()) {
                return Err(Error::validation(
                    format!("feature_models[{i}].uvl_filename"),
                    format!("'{}' is listed twice", fm.uvl_filename),
                ));
            }
        }

        Ok(())
    }
}

fn validate_authors(field: &str, authors: &[AuthorInput]) -> Result<()> {
    for (i, author) in authors.iter().enumerate() {
        if blank(&author.name) {
            return Err(Error::validation(format!("{field}[{i}].name"), "is required"));
        }
    }
    Ok(())
}
