//! easybulk CLI - batch stdin lines into JSON-lines output
//!
//! Every input line becomes one item. Batches are written when `bulk_actions`
//! lines are pending or when the flush interval elapses.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{Context, Result};
use clap::Parser;
use easybulk::{BulkHandler, LoggingListener};
use easybulk_cli::{BulkArgs, JsonLinesSink};
use easybulk_core::config::BulkConfig;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "easybulk")]
#[command(about = "Batch stdin lines into JSON arrays, one per flush")]
#[command(version = easybulk_core::VERSION)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Append batches to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    #[command(flatten)]
    bulk: BulkArgs,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = cli.bulk.apply(
        BulkConfig::load(cli.config.as_deref()).context("Failed to load configuration")?,
    );

    let sink = match &cli.output {
        Some(path) => JsonLinesSink::append_to(path).await?,
        None => JsonLinesSink::stdout(),
    };

    let handler = BulkHandler::builder()
        .config(config)
        .operation(sink)
        .listener(LoggingListener::new("easybulk"))
        .build()
        .context("Failed to start bulk handler")?;

    let accepted = pump_stdin(&handler).await?;

    handler.close().await;
    info!("Processed {accepted} lines");
    Ok(())
}

/// Initialize logging system; logs go to stderr so stdout stays pure output
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("easybulk={level}"))),
        )
        .init();
}

/// Feed stdin into the handler until EOF or Ctrl-C
async fn pump_stdin(handler: &BulkHandler<String>) -> Result<usize> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut accepted = 0usize;

    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("Failed to read stdin")? {
                    Some(line) => {
                        handler.add(line).await?;
                        accepted += 1;
                    }
                    None => {
                        debug!("Reached end of input");
                        break;
                    }
                }
            }
            _ = &mut interrupted => {
                warn!("Interrupted, flushing pending lines");
                break;
            }
        }
    }

    Ok(accepted)
}
