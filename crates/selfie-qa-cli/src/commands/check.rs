//! Check command - score still images against the capture rubric.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use selfie_qa_adapters::{load_frame, ImageFiles};
use selfie_qa_core::domain::CaptureGate;
use selfie_qa_core::modules::{FrameAnalyzer, QualityScorer};
use selfie_qa_core::ports::{AssessmentRecord, ResultOutput};
use selfie_qa_core::{CaptureGateState, DetectionProvider};
use tracing::{debug, info};

use super::detection::DetectionArgs;
use super::ExitCode;
use crate::config::AppConfig;
use crate::output::{CheckProgress, JsonOutput};

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per line)
    #[default]
    Jsonl,
    /// Single JSON array
    Json,
}

/// Shared arguments for still image checks.
#[derive(Args, Clone)]
pub struct CheckArgs {
    /// Files or directories to analyze
    pub paths: Vec<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    #[command(flatten)]
    pub detection: DetectionArgs,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Merged config (populated by `with_config`, not from CLI).
    #[arg(skip)]
    config: Option<AppConfig>,
}

impl CheckArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults (in accessor methods)
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        if !args.recursive {
            args.recursive = config.general.recursive.unwrap_or(false);
        }

        args.detection = args.detection.with_config(config);

        if args.format.is_none() {
            args.format = config
                .output
                .format
                .as_ref()
                .and_then(|s| match s.as_str() {
                    "json" => Some(OutputFormat::Json),
                    "jsonl" => Some(OutputFormat::Jsonl),
                    _ => None,
                });
        }

        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }

        args.config = Some(config.clone());

        args
    }

    /// Get output format with fallback to JSONL.
    fn format(&self) -> OutputFormat {
        self.format.unwrap_or(OutputFormat::Jsonl)
    }
}

/// Result of running the check command.
#[allow(dead_code)] // Fields exposed for programmatic use
pub struct CheckResult {
    /// Number of images scored.
    pub processed: usize,
    /// Number of images skipped.
    pub skipped: usize,
    /// Number of images that left the gate blocked.
    pub blocked: usize,
    /// Exit code.
    pub exit_code: ExitCode,
}

/// Run the check command.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
pub async fn run(args: &CheckArgs) -> Result<CheckResult> {
    info!("Running check command on {} paths", args.paths.len());

    if args.paths.is_empty() {
        anyhow::bail!("No paths specified");
    }

    let config = args.config.clone().unwrap_or_default();
    let files = ImageFiles::new(args.paths.clone(), args.recursive).collect();
    debug!("Found {} image files", files.len());

    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress = CheckProgress::new(files.len() as u64, args.quiet, show_progress);
    let output = JsonOutput::stdout();

    let pipeline = Pipeline {
        analyzer: FrameAnalyzer::new(config.analyzer_config()),
        provider: args.detection.build_provider(&config)?,
        scorer: QualityScorer::default(),
        threshold: args.detection.threshold(),
    };

    let mut processed = 0usize;
    let mut skipped = 0usize;
    let mut blocked = 0usize;
    let mut records = Vec::new();

    for path in files {
        progress.started(&path);

        let record = match pipeline.assess(path.clone()).await {
            Ok(record) => record,
            Err(e) => {
                progress.skipped(&path, &format!("{e:#}"));
                skipped += 1;
                continue;
            }
        };

        if record.gate == CaptureGateState::Blocked {
            blocked += 1;
        }
        progress.completed(&record);

        match args.format() {
            OutputFormat::Jsonl => output.write(&record)?,
            OutputFormat::Json => records.push(record),
        }
        processed += 1;
    }

    if matches!(args.format(), OutputFormat::Json) {
        output.write_array(&records, args.pretty)?;
    }
    output.flush()?;

    progress.finished(processed, skipped);

    let exit_code = if blocked > 0 {
        ExitCode::Blocked
    } else {
        ExitCode::Success
    };

    Ok(CheckResult {
        processed,
        skipped,
        blocked,
        exit_code,
    })
}

/// One-shot analysis of a single still.
struct Pipeline {
    analyzer: FrameAnalyzer,
    provider: std::sync::Arc<dyn DetectionProvider>,
    scorer: QualityScorer,
    threshold: u8,
}

impl Pipeline {
    async fn assess(&self, path: PathBuf) -> Result<AssessmentRecord> {
        let frame = load_frame(&path)?;

        let analysis = self.analyzer.analyze(&frame);
        if let Some(failure) = analysis.failure {
            anyhow::bail!("{}: {failure}", path.display());
        }

        let detection = self.provider.analyze(&frame).await.sanitized();
        let assessment = self.scorer.score(&analysis.stats, &detection);

        let mut gate = CaptureGate::new(self.threshold);
        gate.observe(assessment.overall_score);
        debug!(
            "{}: score {} ({} issue(s))",
            path.display(),
            assessment.overall_score,
            assessment.issues.len()
        );

        Ok(AssessmentRecord {
            path: Some(path),
            tick: None,
            gate: gate.state(),
            assessment,
        })
    }
}
