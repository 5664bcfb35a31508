//! Detection provider options shared by `check` and `live`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use selfie_qa_adapters::{RemoteDetectionProvider, RemoteProviderConfig};
use selfie_qa_core::modules::FaceRegionEstimator;
use selfie_qa_core::providers::{
    AttributeSource, FixedAttributes, HeuristicProvider, StochasticAttributes,
    StochasticAttributesConfig,
};
use selfie_qa_core::DetectionProvider;
use tracing::debug;

use crate::config::{defaults, AppConfig};

/// Which detection provider scores faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ProviderKind {
    /// Skin-tone face region heuristic with placeholder attributes
    #[default]
    Heuristic,
    /// HTTP detection service
    Remote,
}

impl ProviderKind {
    fn from_config(value: &str) -> Option<Self> {
        match value {
            "heuristic" => Some(Self::Heuristic),
            "remote" => Some(Self::Remote),
            _ => None,
        }
    }
}

/// Parse and validate a gate threshold (0-100).
fn parse_threshold(s: &str) -> Result<u8, String> {
    let value: u8 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid score"))?;
    if value <= 100 {
        Ok(value)
    } else {
        Err(format!("{value} is not in 0..=100"))
    }
}

/// Provider and gate arguments.
#[derive(Args, Clone, Debug, Default)]
pub struct DetectionArgs {
    /// Detection provider
    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    /// Remote detection endpoint URL
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Seed for the placeholder face attributes
    #[arg(long)]
    pub seed: Option<u64>,

    /// Report fixed frontal attributes instead of random ones
    #[arg(long)]
    pub fixed_attributes: bool,

    /// Score at or above which capture is allowed (0-100)
    #[arg(long, value_parser = parse_threshold)]
    pub threshold: Option<u8>,
}

impl DetectionArgs {
    /// Fills unset options from the configuration file.
    #[must_use]
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        if self.provider.is_none() {
            self.provider = config
                .provider
                .kind
                .as_deref()
                .and_then(ProviderKind::from_config);
        }
        if self.endpoint.is_none() {
            self.endpoint.clone_from(&config.provider.endpoint);
        }
        self.seed = self.seed.or(config.provider.seed);
        if !self.fixed_attributes {
            self.fixed_attributes = config.provider.fixed_attributes.unwrap_or(false);
        }
        self.threshold = self.threshold.or(config.capture.threshold);
        self
    }

    /// Gate threshold with fallback to the hardcoded default.
    pub fn threshold(&self) -> u8 {
        self.threshold.unwrap_or(defaults::GATE_THRESHOLD)
    }

    /// Provider kind with fallback to the heuristic.
    pub fn provider(&self) -> ProviderKind {
        self.provider.unwrap_or_default()
    }

    /// Builds the selected provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote endpoint is invalid.
    pub fn build_provider(&self, config: &AppConfig) -> Result<Arc<dyn DetectionProvider>> {
        match self.provider() {
            ProviderKind::Heuristic => {
                let estimator = FaceRegionEstimator::new(config.face_config());
                let attributes: Arc<dyn AttributeSource> = if self.fixed_attributes {
                    debug!("Using fixed frontal face attributes");
                    Arc::new(FixedAttributes::frontal())
                } else {
                    debug!("Using placeholder face attributes (seed: {:?})", self.seed);
                    Arc::new(StochasticAttributes::new(StochasticAttributesConfig {
                        seed: self.seed,
                        ..StochasticAttributesConfig::default()
                    }))
                };
                Ok(Arc::new(HeuristicProvider::new(estimator, attributes)))
            }
            ProviderKind::Remote => {
                let base = RemoteProviderConfig::default();
                let remote = RemoteProviderConfig {
                    endpoint: self.endpoint.clone().unwrap_or(base.endpoint),
                    request_timeout: config
                        .provider
                        .request_timeout_ms
                        .map_or(base.request_timeout, Duration::from_millis),
                };
                debug!("Using remote detection endpoint {}", remote.endpoint);
                let provider = RemoteDetectionProvider::new(remote)
                    .context("Failed to set up remote detection provider")?;
                Ok(Arc::new(provider))
            }
        }
    }
}
