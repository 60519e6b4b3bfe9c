//! Client for the local detection service.
//!
//! The detector runs the object-detection model over an uploaded video and
//! answers with a per-class summary and an optional snapshot path. This
//! crate only forwards the request; the service owns decoding and inference.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Errors from a detector call.
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    #[error("Detector request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Detector error ({status}): {body}")]
    Api { status: u16, body: String },
}

/// Response from `POST /api/process_video/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorResponse {
    pub status: String,
    #[serde(default)]
    pub summary: Option<Value>,
    #[serde(default)]
    pub snapshot_path: Option<String>,
}

impl DetectorResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug, Serialize)]
struct ProcessVideoRequest<'a> {
    filename: &'a str,
}

/// HTTP client for the detection service.
#[derive(Clone)]
pub struct DetectorClient {
    client: reqwest::Client,
    base_url: String,
}

impl DetectorClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DetectorError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Ask the detector to process a stored upload by filename.
    pub async fn process_video(&self, filename: &str) -> Result<DetectorResponse, DetectorError> {
        let url = format!("{}/api/process_video/", self.base_url);
        tracing::info!(filename, url = %url, "Requesting video processing");

        let response = self
            .client
            .post(&url)
            .json(&ProcessVideoRequest { filename })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DetectorError::Api { status, body });
        }

        Ok(response.json().await?)
    }
}
