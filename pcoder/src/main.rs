//! Portable Coder - launcher
//!
//! Runs coding assistants directly on the host or inside the portable Linux
//! VM, keeping each tool's credentials in its own isolated home.

#![forbid(unsafe_code)]

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use pcoder_common::{LogConfig, init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout belongs to the tool; diagnostics go to stderr.
    let mut log_config = LogConfig::from_env("warn").with_stderr();
    if cli.verbose {
        log_config = log_config.with_level("debug");
    }
    let logging_guards = init_logging(&log_config)?;

    let code = commands::dispatch(cli.command).await?;

    drop(logging_guards);
    std::process::exit(code);
}
