// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # SHROUD Scenario Runner
//!
//! Entry point for the `shroud` binary. Parses CLI arguments, initializes
//! logging, replays a scenario against an in-memory ledger and prints the
//! JSON report.
//!
//! - `run`     — replay a scenario file
//! - `demo`    — replay the bundled approval-gated transfer scenario
//! - `version` — print build version information

mod cli;
mod logging;
mod scenario;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;

use cli::{Commands, LogArgs, RunArgs, ShroudCli};
use scenario::{Report, Scenario};

fn main() -> Result<()> {
    let cli = ShroudCli::parse();

    match cli.command {
        Commands::Run(args) => run_scenario(args),
        Commands::Demo(log) => run_demo(log),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

fn run_scenario(args: RunArgs) -> Result<()> {
    logging::init_logging(&args.log.log_level, args.log.log_format);

    let scenario = Scenario::from_file(&args.scenario)?;
    let report = scenario::replay(&scenario)
        .with_context(|| format!("failed to replay {}", args.scenario.display()))?;
    emit(&report, args.output.as_deref())
}

fn run_demo(log: LogArgs) -> Result<()> {
    logging::init_logging(&log.log_level, log.log_format);

    let scenario = Scenario::demo()?;
    let report = scenario::replay(&scenario).context("failed to replay the demo")?;
    emit(&report, None)
}

/// Print the report to stdout, or write it to `output`.
fn emit(report: &Report, output: Option<&Path>) -> Result<()> {
    let rejected = report.rejected().count();
    tracing::info!(
        scenario = %report.scenario,
        steps = report.steps.len(),
        rejected,
        records = report.total_records,
        "scenario finished"
    );

    let json = serde_json::to_string_pretty(report).context("failed to encode report")?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn print_version() {
    println!("shroud   {}", env!("CARGO_PKG_VERSION"));
    println!("protocol {}", shroud_protocol::config::PROTOCOL_VERSION);
    println!("domain   {}", shroud_protocol::config::PROTOCOL_FINGERPRINT);
}
