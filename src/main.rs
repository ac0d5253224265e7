//! Sheet Relay Worker - extracts contact tables from Google Sheets
//!
//! Each queue message names a spreadsheet, a worksheet and a webhook. The
//! worker reads the contact table from the sheet and POSTs it to the webhook.

mod cli;
mod config;
mod error;
mod handlers;
mod services;
mod types;

use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

use crate::cli::{Cli, Command};
use crate::handlers::BatchHandler;
use crate::services::sheets::{GoogleSheetsClient, SpreadsheetService};
use crate::services::sqs_poller::{SqsPoller, SqsPollerConfig};
use crate::services::webhook::{HttpWebhookSender, WebhookSender};
use crate::types::QueueEvent;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs directory - use LOGS_DIR env var or default to ../logs
    let logs_dir = std::env::var("LOGS_DIR")
        .unwrap_or_else(|_| "../logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(
        Rotation::DAILY,
        &logs_dir,
        "worker.log",
    );
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Initialize logging - both stdout and file
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,sheet_relay_worker=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())  // stdout
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))  // file
        .init();

    info!("Starting Sheet Relay Worker...");

    let config = config::Config::from_env()?;
    info!("Configuration loaded");

    let sheets: Arc<dyn SpreadsheetService> = Arc::new(GoogleSheetsClient::new(config.sheets.clone()));
    let webhook: Arc<dyn WebhookSender> = Arc::new(HttpWebhookSender::new(config.webhook_timeout));
    info!("Using {} spreadsheet service", sheets.name());

    let handler = Arc::new(BatchHandler::new(sheets, webhook));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let queue_url = config
                .sqs_queue_url
                .clone()
                .context("SQS_QUEUE_URL must be set to poll the queue")?;

            let poller = SqsPoller::new(
                SqsPollerConfig {
                    queue_url,
                    wait_time_secs: config.sqs_wait_time_secs,
                    max_messages: config.sqs_max_messages,
                },
                handler,
            )
            .await;

            if let Err(e) = poller.run().await {
                error!("Poller error: {}", e);
                return Err(e);
            }
        }
        Command::ProcessEvent { file } => {
            let raw = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read event file {}", path.display()))?,
                None => {
                    let mut raw = String::new();
                    std::io::stdin()
                        .read_to_string(&mut raw)
                        .context("Failed to read event from stdin")?;
                    raw
                }
            };

            let event: QueueEvent = serde_json::from_str(&raw).context("Failed to parse queue event")?;
            let summary = handler.handle(&event).await?;

            info!(
                "Event processed: {} delivered, {} failed",
                summary.delivered.len(),
                summary.failed.len()
            );
            for failed in &summary.failed {
                info!("  {}: {}", failed.task_id, failed.reason);
            }
        }
    }

    Ok(())
}
