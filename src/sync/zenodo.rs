// src/sync/zenodo.rs

//! Zenodo deposition API client
//!
//! Endpoints used, relative to the configured base URL:
//! - `POST deposit/depositions` create
//! - `POST deposit/depositions/{id}/files` upload (multipart `name` + `file`)
//! - `POST deposit/depositions/{id}/actions/publish`
//! - `GET  deposit/depositions/{id}` read back the DOI

use super::archive::{ArchivalService, Deposition, DepositionMetadata};
use crate::config::ArchiveSection;
use crate::error::{Error, Result};
use reqwest::blocking::{Client, Response, multipart};
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Blocking Zenodo client authenticated with a bearer token
pub struct ZenodoClient {
    client: Client,
    base_url: String,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct CreatedDeposition {
    id: i64,
    #[serde(default)]
    conceptrecid: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct DepositionState {
    #[serde(default)]
    doi: Option<String>,
}

impl ZenodoClient {
    pub fn new(base_url: &str, access_token: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        })
    }

    pub fn from_config(config: &ArchiveSection) -> Result<Self> {
        Self::new(&config.base_url, &config.access_token, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn depositions_url(&self) -> String {
        format!("{}/deposit/depositions", self.base_url)
    }

    fn deposition_url(&self, deposition_id: i64) -> String {
        format!("{}/{}", self.depositions_url(), deposition_id)
    }

    fn check(response: reqwest::Result<Response>, what: &str) -> Result<Response> {
        let response = response
            .map_err(|e| Error::ExternalServiceError(format!("{what}: request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::ExternalServiceError(format!(
                "{what}: HTTP {status}: {}",
                body.trim()
            )));
        }
        Ok(response)
    }
}

impl ArchivalService for ZenodoClient {
    fn create_deposition(&self, metadata: &DepositionMetadata) -> Result<Deposition> {
        let url = self.depositions_url();
        debug!("Creating deposition at {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&json!({ "metadata": metadata }))
            .send();
        let created: CreatedDeposition = Self::check(response, "create deposition")?
            .json()
            .map_err(|e| Error::ExternalServiceError(format!("create deposition: {e}")))?;

        let concept_record_id = match created.conceptrecid {
            Some(Value::String(id)) if !id.is_empty() => id,
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(Error::ExternalServiceError(format!(
                    "create deposition: response for {} lacks conceptrecid",
                    created.id
                )));
            }
        };

        info!("Created deposition {}", created.id);
        Ok(Deposition {
            id: created.id,
            concept_record_id,
        })
    }

    fn upload_file(&self, deposition_id: i64, name: &str, path: &Path) -> Result<()> {
        let url = format!("{}/files", self.deposition_url(deposition_id));
        let form = multipart::Form::new()
            .text("name", name.to_string())
            .file("file", path)
            .map_err(|e| Error::IoError(format!("Failed to read {}: {e}", path.display())))?;

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send();
        Self::check(response, &format!("upload {name}"))?;

        debug!("Uploaded {} to deposition {}", name, deposition_id);
        Ok(())
    }

    fn publish(&self, deposition_id: i64) -> Result<()> {
        let url = format!("{}/actions/publish", self.deposition_url(deposition_id));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .send();
        Self::check(response, "publish deposition")?;

        info!("Published deposition {}", deposition_id);
        Ok(())
    }

    fn fetch_doi(&self, deposition_id: i64) -> Result<String> {
        let url = self.deposition_url(deposition_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send();
        let state: DepositionState = Self::check(response, "fetch deposition")?
            .json()
            .map_err(|e| Error::ExternalServiceError(format!("fetch deposition: {e}")))?;

        state.doi.filter(|doi| !doi.is_empty()).ok_or_else(|| {
            Error::ExternalServiceError(format!("Deposition {deposition_id} has no DOI"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_ignore_trailing_slash() {
        let client =
            ZenodoClient::new("https://sandbox.zenodo.org/api/", "t", Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            client.depositions_url(),
            "https://sandbox.zenodo.org/api/deposit/depositions"
        );
        assert_eq!(
            client.deposition_url(12),
            "https://sandbox.zenodo.org/api/deposit/depositions/12"
        );
    }
}
