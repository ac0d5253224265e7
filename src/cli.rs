//! CLI argument parsing for the sheet-relay-worker binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sheet-relay-worker", about = "Relays contact tables from Google Sheets to webhooks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Poll the SQS queue (default if no subcommand given)
    Serve,
    /// Process one Lambda-style SQS event and exit
    ProcessEvent {
        /// Event JSON file; reads stdin when omitted
        #[arg(long)]
        file: Option<PathBuf>,
    },
}
