//! prefill command-line driver.
//!
//! `preload` plays the producer context: it fetches every identifier and
//! writes the transfer string. `hydrate` plays the consumer context: it
//! restores a transfer string and reports the state each identifier's hook
//! would render with. Logging goes to stderr so stdout carries only output.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use prefill_client::{FetchCoordinator, HttpTransport, TransportConfig};
use prefill_core::{AppConfig, Store};
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "prefill")]
#[command(about = "Preload JSON resources and hydrate them into another process", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch every identifier once and emit the transfer string
    Preload {
        /// Resource identifiers (absolute URLs, or paths joined onto PREFILL_BASE_URL)
        #[arg(required = true)]
        ids: Vec<String>,

        /// Write the transfer string here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Restore a transfer string, then resolve identifiers through data hooks
    Hydrate {
        /// File holding a transfer string produced by `preload`
        transfer: PathBuf,

        /// Resource identifiers to bind hooks for
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    let transport = Arc::new(HttpTransport::new(TransportConfig::from(&config))?);
    let coordinator = FetchCoordinator::new(Store::new(), transport.clone());

    match cli.command {
        Command::Preload { ids, out } => {
            let transfer = commands::preload(&coordinator, &ids).await?;
            match out {
                Some(path) => tokio::fs::write(&path, transfer)
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => {
                    let mut stdout = tokio::io::stdout();
                    stdout.write_all(transfer.as_bytes()).await?;
                    stdout.write_all(b"\n").await?;
                }
            }
            tracing::info!(resources = coordinator.store().len(), "preload complete");
        }
        Command::Hydrate { transfer, ids } => {
            let text = match tokio::fs::read_to_string(&transfer).await {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::warn!(path = %transfer.display(), error = %e, "transfer file unreadable; starting cold");
                    None
                }
            };

            let report = commands::hydrate(&coordinator, text.as_deref(), &ids).await;
            let mut stdout = tokio::io::stdout();
            for line in report.lines() {
                stdout.write_all(line.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
            }
            tracing::info!(network_calls = transport.requests_sent(), "hydrate complete");
        }
    }

    Ok(())
}
