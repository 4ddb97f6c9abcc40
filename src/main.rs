//! tap-codecov CLI
//!
//! Records go to stdout; logs go to stderr.

use anyhow::Context;
use clap::Parser;
use tap_codecov::cli::{Cli, Runner};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let runner = Runner::new(cli);
    runner.run().await.context("tap-codecov failed")?;
    Ok(())
}
