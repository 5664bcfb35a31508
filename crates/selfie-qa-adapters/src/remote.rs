//! Remote detection provider speaking the JSON detection contract.
//!
//! Each call POSTs one PNG-encoded frame (`Content-Type: image/png`) and
//! expects a JSON [`DetectionResult`] back. The answer is sanitized before it
//! is used. Any transport, status or decode failure is logged and reported as
//! "no face detected".

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use selfie_qa_core::{DetectionProvider, DetectionResult, Frame, StillFormat};
use tracing::{debug, warn};

/// Configuration for [`RemoteDetectionProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteProviderConfig {
    /// Detection endpoint URL.
    pub endpoint: String,
    /// Client-side request timeout.
    ///
    /// The loop's latency budget still applies on top of this.
    pub request_timeout: Duration,
}

impl Default for RemoteProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/detect".to_string(),
            request_timeout: Duration::from_secs(2),
        }
    }
}

/// HTTP client for a remote face detector.
#[derive(Debug, Clone)]
pub struct RemoteDetectionProvider {
    client: reqwest::Client,
    config: RemoteProviderConfig,
}

impl RemoteDetectionProvider {
    /// Creates a provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a valid URL or the HTTP client
    /// cannot be built.
    pub fn new(config: RemoteProviderConfig) -> Result<Self> {
        reqwest::Url::parse(&config.endpoint)
            .with_context(|| format!("Invalid detection endpoint: {}", config.endpoint))?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    /// Returns the provider configuration.
    #[must_use]
    pub const fn config(&self) -> &RemoteProviderConfig {
        &self.config
    }

    /// Sends one frame and decodes the answer.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding, the request, the status or the JSON body
    /// is bad.
    pub async fn request(&self, frame: &Frame) -> Result<DetectionResult> {
        let encoded = frame
            .encode(StillFormat::Png)
            .context("Failed to encode frame")?;

        let response = self
            .client
            .post(&self.config.endpoint)
            .header(CONTENT_TYPE, StillFormat::Png.mime_type())
            .body(encoded.bytes)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.config.endpoint))?
            .error_for_status()
            .context("Detection service returned an error status")?;

        let detection: DetectionResult = response
            .json()
            .await
            .context("Failed to decode detection response")?;
        Ok(detection.sanitized())
    }
}

#[async_trait]
impl DetectionProvider for RemoteDetectionProvider {
    async fn analyze(&self, frame: &Frame) -> DetectionResult {
        match self.request(frame).await {
            Ok(detection) => {
                debug!(
                    "Remote detection: detected={} confidence={:.2}",
                    detection.face_detected, detection.confidence
                );
                detection
            }
            Err(e) => {
                warn!("Remote detection failed, reporting no face: {e:#}");
                DetectionResult::not_detected()
            }
        }
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
