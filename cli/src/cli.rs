//! # CLI Interface
//!
//! Command-line structure for `shroud`, via `clap` derive: `run`, `demo`
//! and `version`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::{LogFormat, DEFAULT_FILTER};

/// SHROUD scenario runner.
///
/// Replays a JSON scenario against an in-memory confidential ledger and
/// prints a JSON report of every step, the effect records it produced and
/// each participant's decrypted balance.
#[derive(Parser, Debug)]
#[command(
    name = "shroud",
    about = "SHROUD confidential ledger scenario runner",
    version,
    propagate_version = true
)]
pub struct ShroudCli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a scenario file.
    Run(RunArgs),
    /// Replay the bundled approval-gated transfer scenario.
    Demo(LogArgs),
    /// Print version information and exit.
    Version,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the scenario file (JSON).
    #[arg(long, short = 's', env = "SHROUD_SCENARIO")]
    pub scenario: PathBuf,

    /// Write the report here instead of stdout.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub log: LogArgs,
}

#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    /// Log output format.
    #[arg(long, value_enum, env = "SHROUD_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = DEFAULT_FILTER)]
    pub log_level: String,
}
