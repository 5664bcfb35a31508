//! Configuration file support for selfie-qa.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/selfie-qa/config.toml` (lowest priority)
//! - Project-local: `.selfie-qa.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use selfie_qa_core::modules::{AnalyzerConfig, FaceRegionConfig};
use selfie_qa_core::StillFormat;
use serde::Deserialize;
use tracing::{debug, info};

/// Hardcoded fallbacks for values that have no library default.
pub mod defaults {
    use selfie_qa_core::domain::CaptureGate;

    /// Gate threshold.
    pub const GATE_THRESHOLD: u8 = CaptureGate::DEFAULT_THRESHOLD;
    /// JPEG quality for confirmed stills.
    pub const JPEG_QUALITY: u8 = 90;
}

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General options.
    pub general: GeneralConfig,
    /// Photometric analysis settings.
    pub analysis: AnalysisConfig,
    /// Face heuristic settings.
    pub face: FaceConfig,
    /// Analysis loop timing.
    pub scheduler: SchedulerConfig,
    /// Detection provider selection.
    pub provider: ProviderConfig,
    /// Capture gate and still encoding.
    pub capture: CaptureConfig,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// General configuration options.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Recurse into subdirectories by default.
    pub recursive: Option<bool>,
}

/// Photometric analysis configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Sharpness sampling step in pixels.
    pub sample_step: Option<u32>,
    /// Sharpness multiplier.
    pub sharpness_scale: Option<f64>,
}

/// Face heuristic configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FaceConfig {
    /// Search window radius divisor.
    pub window_divisor: Option<u32>,
    /// Skin sampling step in pixels.
    pub sample_step: Option<u32>,
    /// Minimum skin ratio for a detection (0.0-1.0).
    pub min_skin_ratio: Option<f32>,
}

/// Analysis loop configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Tick interval in milliseconds.
    pub cadence_ms: Option<u64>,
    /// Provider latency budget in milliseconds.
    pub latency_budget_ms: Option<u64>,
}

/// Detection provider configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider kind: "heuristic" or "remote".
    pub kind: Option<String>,
    /// Remote endpoint URL.
    pub endpoint: Option<String>,
    /// Remote request timeout in milliseconds.
    pub request_timeout_ms: Option<u64>,
    /// Seed for the placeholder attribute source.
    pub seed: Option<u64>,
    /// Use fixed frontal attributes instead of random ones.
    pub fixed_attributes: Option<bool>,
}

/// Capture configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Gate threshold (0-100).
    pub threshold: Option<u8>,
    /// Still format: "png" or "jpeg".
    pub format: Option<String>,
    /// JPEG quality (1-100).
    pub jpeg_quality: Option<u8>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress.
    pub progress: Option<bool>,
}

/// Clears `value` unless `valid` accepts it, recording why.
fn keep_if<T: std::fmt::Display>(
    value: &mut Option<T>,
    valid: impl FnOnce(&T) -> bool,
    name: &str,
    expected: &str,
    warnings: &mut Vec<String>,
) {
    if let Some(v) = value.take() {
        if valid(&v) {
            *value = Some(v);
        } else {
            warnings.push(format!("{name} must be {expected}, got {v}; using the default"));
        }
    }
}

/// Clears `value` unless it is greater than zero. NaN is not.
fn keep_positive<T: PartialOrd + Default + std::fmt::Display>(
    value: &mut Option<T>,
    name: &str,
    warnings: &mut Vec<String>,
) {
    keep_if(
        value,
        |v| v.partial_cmp(&T::default()) == Some(Ordering::Greater),
        name,
        "positive",
        warnings,
    );
}

/// Clears `value` unless it is one of `allowed`.
fn keep_one_of(
    value: &mut Option<String>,
    allowed: &[&str],
    name: &str,
    warnings: &mut Vec<String>,
) {
    let expected = format!(
        "one of {}",
        allowed
            .iter()
            .map(|a| format!("'{a}'"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    keep_if(value, |v| allowed.contains(&v.as_str()), name, &expected, warnings);
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/selfie-qa/config.toml`
    /// 2. Project-local: `.selfie-qa.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are reported as
    /// warnings and replaced by their defaults.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        for warning in config.validate() {
            eprintln!("warning: {warning}");
        }

        config
    }

    /// Validate configuration values are within acceptable ranges.
    /// Resets every out-of-range value to its default, returning one
    /// warning per reset field.
    fn validate(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();
        let w = &mut warnings;

        keep_positive(&mut self.analysis.sample_step, "analysis.sample_step", w);
        keep_if(
            &mut self.analysis.sharpness_scale,
            |v| v.is_finite() && *v > 0.0,
            "analysis.sharpness_scale",
            "a positive number",
            w,
        );
        keep_positive(&mut self.face.window_divisor, "face.window_divisor", w);
        keep_positive(&mut self.face.sample_step, "face.sample_step", w);
        keep_if(
            &mut self.face.min_skin_ratio,
            |r| (0.0..=1.0).contains(r),
            "face.min_skin_ratio",
            "0.0-1.0",
            w,
        );
        keep_positive(&mut self.scheduler.cadence_ms, "scheduler.cadence_ms", w);
        keep_positive(
            &mut self.scheduler.latency_budget_ms,
            "scheduler.latency_budget_ms",
            w,
        );
        keep_positive(
            &mut self.provider.request_timeout_ms,
            "provider.request_timeout_ms",
            w,
        );
        keep_one_of(&mut self.provider.kind, &["heuristic", "remote"], "provider.kind", w);
        keep_if(
            &mut self.capture.threshold,
            |t| *t <= 100,
            "capture.threshold",
            "0-100",
            w,
        );
        keep_one_of(&mut self.capture.format, &["png", "jpeg"], "capture.format", w);
        keep_if(
            &mut self.capture.jpeg_quality,
            |q| (1..=100).contains(q),
            "capture.jpeg_quality",
            "1-100",
            w,
        );
        keep_one_of(&mut self.output.format, &["json", "jsonl"], "output.format", w);

        warnings
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        // General
        self.general.recursive = other.general.recursive.or(self.general.recursive);

        // Analysis
        self.analysis.sample_step = other.analysis.sample_step.or(self.analysis.sample_step);
        self.analysis.sharpness_scale = other
            .analysis
            .sharpness_scale
            .or(self.analysis.sharpness_scale);

        // Face
        self.face.window_divisor = other.face.window_divisor.or(self.face.window_divisor);
        self.face.sample_step = other.face.sample_step.or(self.face.sample_step);
        self.face.min_skin_ratio = other.face.min_skin_ratio.or(self.face.min_skin_ratio);

        // Scheduler
        self.scheduler.cadence_ms = other.scheduler.cadence_ms.or(self.scheduler.cadence_ms);
        self.scheduler.latency_budget_ms = other
            .scheduler
            .latency_budget_ms
            .or(self.scheduler.latency_budget_ms);

        // Provider
        self.provider.kind = other.provider.kind.or_else(|| self.provider.kind.take());
        self.provider.endpoint = other
            .provider
            .endpoint
            .or_else(|| self.provider.endpoint.take());
        self.provider.request_timeout_ms = other
            .provider
            .request_timeout_ms
            .or(self.provider.request_timeout_ms);
        self.provider.seed = other.provider.seed.or(self.provider.seed);
        self.provider.fixed_attributes = other
            .provider
            .fixed_attributes
            .or(self.provider.fixed_attributes);

        // Capture
        self.capture.threshold = other.capture.threshold.or(self.capture.threshold);
        self.capture.format = other.capture.format.or_else(|| self.capture.format.take());
        self.capture.jpeg_quality = other.capture.jpeg_quality.or(self.capture.jpeg_quality);

        // Output
        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
        self.output.progress = other.output.progress.or(self.output.progress);
    }

    /// Photometric analyzer settings, falling back to library defaults.
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        let base = AnalyzerConfig::default();
        AnalyzerConfig {
            sample_step: self.analysis.sample_step.unwrap_or(base.sample_step),
            sharpness_scale: self.analysis.sharpness_scale.unwrap_or(base.sharpness_scale),
        }
    }

    /// Face heuristic settings, falling back to library defaults.
    pub fn face_config(&self) -> FaceRegionConfig {
        let base = FaceRegionConfig::default();
        FaceRegionConfig {
            window_divisor: self.face.window_divisor.unwrap_or(base.window_divisor),
            sample_step: self.face.sample_step.unwrap_or(base.sample_step),
            min_skin_ratio: self.face.min_skin_ratio.unwrap_or(base.min_skin_ratio),
        }
    }

    /// Encoding for confirmed stills.
    pub fn still_format(&self) -> StillFormat {
        match self.capture.format.as_deref() {
            Some("jpeg") => StillFormat::Jpeg {
                quality: self.capture.jpeg_quality.unwrap_or(defaults::JPEG_QUALITY),
            },
            _ => StillFormat::Png,
        }
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("selfie-qa").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.selfie-qa.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(".selfie-qa.toml");
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> AppConfig {
        toml::from_str(toml).expect("parse config")
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.capture.threshold.is_none());
        assert!(config.scheduler.cadence_ms.is_none());
        assert!(config.provider.kind.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = parse("");
        assert!(config.face.min_skin_ratio.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let mut config = parse(
            r"
[general]
recursive = true

[analysis]
sample_step = 10
sharpness_scale = 3.0

[face]
window_divisor = 4
sample_step = 2
min_skin_ratio = 0.2

[scheduler]
cadence_ms = 1000
latency_budget_ms = 300

[provider]
kind = 'remote'
endpoint = 'http://localhost:9000/detect'
request_timeout_ms = 750
seed = 7
fixed_attributes = true

[capture]
threshold = 60
format = 'jpeg'
jpeg_quality = 80

[output]
format = 'json'
pretty = true
progress = false
",
        );

        assert_eq!(config.general.recursive, Some(true));
        assert_eq!(config.analysis.sample_step, Some(10));
        assert_eq!(config.face.window_divisor, Some(4));
        assert_eq!(config.scheduler.cadence_ms, Some(1000));
        assert_eq!(config.provider.kind.as_deref(), Some("remote"));
        assert_eq!(config.provider.seed, Some(7));
        assert_eq!(config.capture.threshold, Some(60));
        assert_eq!(config.output.format, Some("json".to_string()));
        assert!(config.validate().is_empty());
        assert_eq!(config.capture.threshold, Some(60));
    }

    #[test]
    fn test_merge_configs() {
        let mut base = parse(
            r"
[scheduler]
cadence_ms = 1500

[capture]
threshold = 40
",
        );
        let override_config = parse(
            r"
[scheduler]
cadence_ms = 500

[provider]
seed = 3
",
        );

        base.merge(override_config);

        assert_eq!(base.scheduler.cadence_ms, Some(500));
        assert_eq!(base.capture.threshold, Some(40));
        assert_eq!(base.provider.seed, Some(3));
    }

    #[test]
    fn test_merge_preserves_base_when_override_is_none() {
        let mut base = parse(
            r"
[face]
window_divisor = 4
sample_step = 2
",
        );
        base.merge(parse("[face]\nsample_step = 5\n"));

        assert_eq!(base.face.sample_step, Some(5));
        assert_eq!(base.face.window_divisor, Some(4));
    }

    #[test]
    fn test_merge_empty_override_preserves_base() {
        let mut base = parse("[provider]\nkind = 'remote'\n");
        base.merge(AppConfig::default());
        assert_eq!(base.provider.kind.as_deref(), Some("remote"));
    }

    #[test]
    fn test_library_configs_fall_back_to_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.analyzer_config().sample_step, 20);
        assert_eq!(config.face_config().window_divisor, 3);
        assert_eq!(config.still_format(), StillFormat::Png);
    }

    #[test]
    fn test_library_configs_apply_overrides() {
        let config = parse(
            r"
[scheduler]
cadence_ms = 250

[capture]
format = 'jpeg'
",
        );
        assert_eq!(config.scheduler.cadence_ms, Some(250));
        assert_eq!(config.scheduler.latency_budget_ms, None);
        assert_eq!(config.still_format(), StillFormat::Jpeg { quality: 90 });
    }

    #[test]
    fn test_invalid_toml_syntax_handled() {
        let result: Result<AppConfig, _> = toml::from_str("[capture\nthreshold = 5\n");
        assert!(result.is_err(), "invalid TOML should return error");
    }

    #[test]
    fn test_invalid_field_type_handled() {
        let result: Result<AppConfig, _> = toml::from_str("[capture]\nthreshold = 'high'\n");
        assert!(result.is_err(), "type mismatch should return error");
    }

    #[test]
    fn test_validate_resets_zero_cadence() {
        let mut config = AppConfig::default();
        config.scheduler.cadence_ms = Some(0);
        let warnings = config.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("scheduler.cadence_ms must be positive"));
        assert!(warnings[0].ends_with("using the default"));
        assert_eq!(config.scheduler.cadence_ms, None);
    }

    #[test]
    fn test_validate_resets_skin_ratio_out_of_range() {
        let mut config = AppConfig::default();
        config.face.min_skin_ratio = Some(1.5);
        assert!(config.validate()[0].contains("face.min_skin_ratio"));
        assert_eq!(
            config.face_config().min_skin_ratio,
            FaceRegionConfig::default().min_skin_ratio
        );
    }

    #[test]
    fn test_validate_resets_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider.kind = Some("neural".to_string());
        let warnings = config.validate();
        assert!(warnings[0].contains("provider.kind"));
        assert!(warnings[0].contains("'heuristic'"));
        assert!(config.provider.kind.is_none());
    }

    #[test]
    fn test_validate_resets_threshold_above_100() {
        let mut config = AppConfig::default();
        config.capture.threshold = Some(150);
        assert!(config.validate()[0].contains("capture.threshold"));
        assert!(config.capture.threshold.is_none());
    }

    #[test]
    fn test_validate_resets_nan_sharpness_scale() {
        let mut config = parse("[analysis]\nsharpness_scale = nan\nsample_step = 4\n");
        let warnings = config.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("analysis.sharpness_scale"));
        let analyzer = config.analyzer_config();
        let default_scale = AnalyzerConfig::default().sharpness_scale;
        assert!((analyzer.sharpness_scale - default_scale).abs() < 1e-9);
        assert_eq!(analyzer.sample_step, 4);
    }

    #[test]
    fn test_validate_reports_every_invalid_field() {
        let mut config = AppConfig::default();
        config.output.format = Some("xml".to_string());
        config.capture.jpeg_quality = Some(0);
        config.face.window_divisor = Some(0);
        let warnings = config.validate();
        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().any(|w| w.contains("output.format")));
        assert!(config.output.format.is_none());
        assert!(config.capture.jpeg_quality.is_none());
        assert!(config.face.window_divisor.is_none());
    }

    #[test]
    fn test_validate_empty_config_passes() {
        assert!(AppConfig::default().validate().is_empty());
    }

    #[test]
    fn test_find_config_in_parents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(".selfie-qa.toml"), "").unwrap();
        let found = find_config_in_parents(&nested).unwrap();
        assert_eq!(found, dir.path().join(".selfie-qa.toml"));
    }
}
