// src/main.rs

//! redeemform
//!
//! Entry point for the redeemform CLI.
//!
//! Responsibilities of this file:
//! - Load `.env` and install the log subscriber
//! - Parse CLI arguments
//! - Hand off execution to the runner

use anyhow::Result;
use clap::Parser;
use redeemform::{cli, runner};
use tracing_subscriber::EnvFilter;

/// Program entry point.
///
/// Uses Tokio because a redemption attempt awaits the (simulated) service.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so JSON output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    runner::run(cli).await
}
