//! CLI command definitions and handlers.

pub mod check;
pub mod detection;
pub mod live;

use clap::{Parser, Subcommand};

/// Selfie QA - live frame quality gating
#[derive(Parser)]
#[command(name = "selfie-qa")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shared check arguments (paths, provider, flags).
    #[command(flatten)]
    pub check: check::CheckArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Score still images against the capture rubric
    Check(check::CheckArgs),
    /// Run the live analysis loop over images standing in for a camera
    Live(live::LiveArgs),
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Every assessment passed the gate, or a still was confirmed.
    Success = 0,
    /// At least one assessment left the gate blocked.
    Blocked = 1,
    /// The command could not run.
    Error = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}
