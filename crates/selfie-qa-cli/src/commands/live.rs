//! Live command - run the analysis loop over replayed still images.
//!
//! Committed assessments stream to stdout as JSON Lines. With `--capture-to`,
//! stdin accepts one command per line:
//!
//! - `c` capture the current frame (only while the gate is eligible)
//! - `r` discard the still and resume live analysis
//! - `y` confirm the still and save it
//! - `q` quit

use std::future;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use selfie_qa_adapters::{FileConfirmationSink, ImageFiles, StillFrameSource};
use selfie_qa_core::modules::{FrameAnalyzer, QualityScorer};
use selfie_qa_core::ports::{AssessmentRecord, ResultOutput};
use selfie_qa_core::{
    CaptureGateState, CaptureSession, LiveComponents, LiveEvent, LiveEventSink, LoopConfig,
    SessionConfig, StillFormat,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, trace};

use super::detection::DetectionArgs;
use super::ExitCode;
use crate::config::{defaults, AppConfig};
use crate::output::{JsonOutput, LiveSpinner};

/// Parse a positive number of seconds.
fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number of seconds"))?;
    match Duration::try_from_secs_f64(secs) {
        Ok(d) if !d.is_zero() => Ok(d),
        _ => Err(format!("{secs} is not a positive duration")),
    }
}

/// Arguments for the live loop.
#[derive(Args, Clone)]
pub struct LiveArgs {
    /// Image files or directories replayed as camera frames
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    #[command(flatten)]
    pub detection: DetectionArgs,

    /// Milliseconds between analysis ticks
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub cadence_ms: Option<u64>,

    /// Milliseconds the provider may take before a tick is abandoned
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub budget_ms: Option<u64>,

    /// Stop after this many committed assessments
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub ticks: Option<u64>,

    /// Stop after this many seconds
    #[arg(long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub duration: Option<Duration>,

    /// Read capture commands from stdin and save the confirmed still here
    #[arg(long, value_name = "FILE")]
    pub capture_to: Option<PathBuf>,

    /// Show the live status spinner
    #[arg(long)]
    pub progress: bool,

    /// Suppress status output
    #[arg(short, long)]
    pub quiet: bool,

    /// Merged config (populated by `with_config`, not from CLI).
    #[arg(skip)]
    config: Option<AppConfig>,
}

impl LiveArgs {
    /// Apply configuration file values, respecting CLI precedence.
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        if !args.recursive {
            args.recursive = config.general.recursive.unwrap_or(false);
        }
        args.detection = args.detection.with_config(config);
        args.cadence_ms = args.cadence_ms.or(config.scheduler.cadence_ms);
        args.budget_ms = args.budget_ms.or(config.scheduler.latency_budget_ms);
        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }
        args.config = Some(config.clone());
        args
    }

    fn loop_config(&self) -> LoopConfig {
        let base = LoopConfig::default();
        LoopConfig {
            cadence: self.cadence_ms.map_or(base.cadence, Duration::from_millis),
            latency_budget: self
                .budget_ms
                .map_or(base.latency_budget, Duration::from_millis),
        }
    }

    /// Still encoding: the capture file extension wins over the config.
    fn still_format(&self, config: &AppConfig) -> StillFormat {
        let extension = self
            .capture_to
            .as_deref()
            .and_then(Path::extension)
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        match extension.as_deref() {
            Some("jpg" | "jpeg") => StillFormat::Jpeg {
                quality: config
                    .capture
                    .jpeg_quality
                    .unwrap_or(defaults::JPEG_QUALITY),
            },
            Some("png") => StillFormat::Png,
            _ => config.still_format(),
        }
    }

    const fn has_limit(&self) -> bool {
        self.ticks.is_some() || self.duration.is_some()
    }
}

/// Result of running the live command.
#[allow(dead_code)] // Fields exposed for programmatic use
pub struct LiveResult {
    /// Number of assessments committed.
    pub committed: u64,
    /// Where the confirmed still was saved, if any.
    pub confirmed: Option<PathBuf>,
    /// Exit code.
    pub exit_code: ExitCode,
}

/// Live sink fanning events out to the status spinner and the command loop.
struct EventForwarder {
    tx: mpsc::UnboundedSender<LiveEvent>,
    spinner: LiveSpinner,
}

impl LiveEventSink for EventForwarder {
    fn on_event(&self, event: LiveEvent) {
        self.spinner.on_event(event.clone());
        if self.tx.send(event).is_err() {
            trace!("Live event dropped: receiver closed");
        }
    }
}

/// What a stdin command asks the loop to do next.
enum Step {
    Continue,
    Resumed,
    Quit,
    Confirmed(PathBuf),
}

/// Run the live command.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
pub async fn run(args: &LiveArgs) -> Result<LiveResult> {
    let config = args.config.clone().unwrap_or_default();
    let files = ImageFiles::new(args.paths.clone(), args.recursive);
    let source = StillFrameSource::from_files(&files);
    info!("Starting live loop over {} image files", source.len());

    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let spinner = LiveSpinner::new(args.quiet, show_progress);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let components = LiveComponents::new(
        Box::new(source),
        args.detection.build_provider(&config)?,
    )
    .with_analyzer(FrameAnalyzer::new(config.analyzer_config()))
    .with_scorer(QualityScorer::default())
    .with_events(Arc::new(EventForwarder {
        tx,
        spinner: spinner.clone(),
    }));
    let session_config = SessionConfig {
        scheduler: args.loop_config(),
        gate_threshold: args.detection.threshold(),
        still_format: args.still_format(&config),
    };
    debug!("Session config: {session_config:?}");

    let mut session =
        CaptureSession::start(components, session_config).context("Failed to start live session")?;

    let sink = args.capture_to.as_ref().map(FileConfirmationSink::new);
    let mut commands = sink
        .as_ref()
        .map(|_| BufReader::new(tokio::io::stdin()).lines());
    let deadline = args.duration.and_then(|d| Instant::now().checked_add(d));

    let output = JsonOutput::stdout();
    let mut committed = 0u64;
    let mut last_gate = CaptureGateState::Blocked;
    let mut confirmed = None;

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                if let LiveEvent::TickCommitted { tick, assessment, gate, .. } = event {
                    output.write(&AssessmentRecord {
                        path: None,
                        tick: Some(tick),
                        gate,
                        assessment,
                    })?;
                    output.flush()?;
                    committed += 1;
                    last_gate = gate;
                    if args.ticks.is_some_and(|limit| committed >= limit) {
                        debug!("Tick limit reached");
                        break;
                    }
                }
            }
            line = next_command(&mut commands) => {
                let Some(line) = line.context("Failed to read command from stdin")? else {
                    commands = None;
                    if args.has_limit() {
                        continue;
                    }
                    debug!("Stdin closed, stopping");
                    break;
                };
                let Some(sink) = sink.as_ref() else { continue };
                match handle_command(line.trim(), &mut session, sink, &spinner) {
                    Step::Continue => {}
                    Step::Resumed => last_gate = CaptureGateState::Blocked,
                    Step::Quit => break,
                    Step::Confirmed(path) => {
                        confirmed = Some(path);
                        break;
                    }
                }
            }
            () = wait_until(deadline) => {
                debug!("Duration elapsed");
                break;
            }
            interrupted = tokio::signal::ctrl_c() => {
                interrupted.context("Failed to listen for Ctrl-C")?;
                debug!("Interrupted");
                break;
            }
        }
    }

    session.shutdown();
    spinner.finish(committed);

    let exit_code = if confirmed.is_some() || last_gate == CaptureGateState::Eligible {
        ExitCode::Success
    } else {
        ExitCode::Blocked
    };

    Ok(LiveResult {
        committed,
        confirmed,
        exit_code,
    })
}

async fn next_command(lines: &mut Option<Lines<BufReader<Stdin>>>) -> std::io::Result<Option<String>> {
    match lines {
        Some(lines) => lines.next_line().await,
        None => future::pending().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}

fn handle_command(
    command: &str,
    session: &mut CaptureSession,
    sink: &FileConfirmationSink,
    spinner: &LiveSpinner,
) -> Step {
    match command {
        "" => Step::Continue,
        "c" | "capture" => {
            match session.capture() {
                Ok(still) => spinner.println(&format!(
                    "Captured {}x{} still. Enter 'y' to confirm or 'r' to retake.",
                    still.width, still.height
                )),
                Err(e) => spinner.println(&format!("capture refused: {e}")),
            }
            Step::Continue
        }
        "r" | "retake" => match session.retake() {
            Ok(()) => {
                spinner.println("Retaking; live analysis resumed.");
                Step::Resumed
            }
            Err(e) => {
                spinner.println(&format!("retake refused: {e}"));
                Step::Continue
            }
        },
        "y" | "confirm" => match session.confirm(sink) {
            Ok(image) => {
                spinner.println(&format!(
                    "Saved {} ({} bytes)",
                    sink.path().display(),
                    image.bytes.len()
                ));
                Step::Confirmed(sink.path().to_path_buf())
            }
            Err(e) => {
                spinner.println(&format!("confirm failed: {e}"));
                Step::Continue
            }
        },
        "q" | "quit" => Step::Quit,
        other => {
            spinner.println(&format!(
                "unknown command '{other}' (expected c, r, y or q)"
            ));
            Step::Continue
        }
    }
}
