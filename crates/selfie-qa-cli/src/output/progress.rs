//! Progress adapters using indicatif.

use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};
use selfie_qa_core::ports::AssessmentRecord;
use selfie_qa_core::{CaptureGateState, LiveEvent, LiveEventSink};

const fn gate_label(gate: CaptureGateState) -> &'static str {
    match gate {
        CaptureGateState::Blocked => "blocked",
        CaptureGateState::Eligible => "eligible",
    }
}

/// Progress bar for the check command.
pub struct CheckProgress {
    bar: Option<IndicatifBar>,
    quiet: bool,
}

impl CheckProgress {
    /// Creates a new progress bar.
    ///
    /// # Arguments
    ///
    /// * `total` - Total number of files
    /// * `quiet` - If true, suppress all output
    /// * `show_bar` - If true, show progress bar; otherwise show per-file status
    #[must_use]
    pub fn new(total: u64, quiet: bool, show_bar: bool) -> Self {
        if quiet {
            return Self {
                bar: None,
                quiet: true,
            };
        }

        let bar = show_bar.then(|| {
            let bar = IndicatifBar::new(total);
            if let Ok(style) = ProgressStyle::default_bar().template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            ) {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar
        });

        Self { bar, quiet }
    }

    /// A file is about to be scored.
    pub fn started(&self, path: &Path) {
        if let Some(bar) = &self.bar {
            bar.set_message(path.display().to_string());
        }
    }

    /// A file was scored.
    pub fn completed(&self, record: &AssessmentRecord) {
        if self.quiet {
            return;
        }
        if let Some(bar) = &self.bar {
            bar.inc(1);
        } else if record.gate == CaptureGateState::Blocked {
            if let Some(path) = &record.path {
                eprintln!(
                    "{}: score {} ({}), {} issue(s)",
                    path.display(),
                    record.assessment.overall_score,
                    gate_label(record.gate),
                    record.assessment.issues.len()
                );
            }
        }
    }

    /// A file could not be scored.
    pub fn skipped(&self, path: &Path, reason: &str) {
        if self.quiet {
            return;
        }
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
        eprintln!("WARN: Skipping {}: {reason}", path.display());
    }

    /// All files were handled.
    pub fn finished(&self, processed: usize, skipped: usize) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(format!("Done: {processed} processed, {skipped} skipped"));
        }
    }
}

/// Status spinner for the live command.
///
/// Without a spinner, gate transitions and failures are printed to stderr.
#[derive(Clone)]
pub struct LiveSpinner {
    bar: Option<IndicatifBar>,
    quiet: bool,
}

impl LiveSpinner {
    /// Creates a spinner.
    #[must_use]
    pub fn new(quiet: bool, show_spinner: bool) -> Self {
        if quiet {
            return Self {
                bar: None,
                quiet: true,
            };
        }

        let bar = show_spinner.then(|| {
            let bar = IndicatifBar::new_spinner();
            if let Ok(style) =
                ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
            {
                bar.set_style(style);
            }
            bar.enable_steady_tick(Duration::from_millis(100));
            bar.set_message("starting");
            bar
        });

        Self { bar, quiet }
    }

    /// Prints a line without tearing the spinner.
    ///
    /// Used for replies to interactive commands, so `quiet` does not apply.
    pub fn println(&self, message: &str) {
        match &self.bar {
            Some(bar) => bar.suspend(|| eprintln!("{message}")),
            None => eprintln!("{message}"),
        }
    }

    /// Clears the spinner.
    pub fn finish(&self, committed: u64) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(format!("Done: {committed} assessment(s)"));
        }
    }
}

impl LiveEventSink for LiveSpinner {
    fn on_event(&self, event: LiveEvent) {
        if self.quiet {
            return;
        }

        match (&self.bar, event) {
            (Some(bar), LiveEvent::Started { epoch }) => {
                bar.set_message(format!("live (epoch {epoch}), waiting for first assessment"));
            }
            (Some(bar), LiveEvent::TickCommitted { tick, assessment, gate, .. }) => {
                let hint = assessment
                    .recommendations
                    .first()
                    .map_or(String::new(), |r| format!(" - {r}"));
                bar.set_message(format!(
                    "tick {tick}: score {} ({}){hint}",
                    assessment.overall_score,
                    gate_label(gate)
                ));
            }
            (Some(bar), LiveEvent::AnalysisFailed { tick, failure }) => {
                bar.set_message(format!("tick {tick}: analysis failed: {failure}"));
            }
            (Some(bar), LiveEvent::Stopped { .. }) => bar.set_message("paused"),
            (None, LiveEvent::TickCommitted { tick, transition: Some(t), .. }) => {
                eprintln!(
                    "tick {tick}: gate {} -> {}",
                    gate_label(t.from),
                    gate_label(t.to)
                );
            }
            (None, LiveEvent::AnalysisFailed { tick, failure }) => {
                eprintln!("tick {tick}: analysis failed: {failure}");
            }
            _ => {}
        }
    }
}
