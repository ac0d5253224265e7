//! Configuration management

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::services::sheets::{GoogleCredentials, GoogleSheetsConfig};

const DEFAULT_WAIT_TIME_SECS: i32 = 20;
const DEFAULT_MAX_MESSAGES: i32 = 10;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Sheets API endpoints and service account
    pub sheets: GoogleSheetsConfig,

    /// Queue to poll (only required by `serve`)
    pub sqs_queue_url: Option<String>,

    /// Long-poll wait per receive call
    pub sqs_wait_time_secs: i32,

    /// Messages per batch (SQS allows 1-10)
    pub sqs_max_messages: i32,

    /// Webhook request timeout; unset means no local timeout
    pub webhook_timeout: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let client_email = std::env::var("GOOGLE_SERVICE_ACCOUNT_EMAIL")
            .context("GOOGLE_SERVICE_ACCOUNT_EMAIL must be set")?;
        let private_key = std::env::var("GOOGLE_SERVICE_ACCOUNT_KEY")
            .context("GOOGLE_SERVICE_ACCOUNT_KEY must be set")?;

        let mut sheets = GoogleSheetsConfig::new(GoogleCredentials::new(client_email, &private_key));
        if let Ok(api_url) = std::env::var("SHEETS_API_URL") {
            sheets.api_url = api_url;
        }
        if let Ok(token_url) = std::env::var("GOOGLE_TOKEN_URL") {
            sheets.token_url = token_url;
        }

        let sqs_queue_url = std::env::var("SQS_QUEUE_URL").ok().filter(|url| !url.is_empty());

        let sqs_wait_time_secs = parse_env("SQS_WAIT_TIME_SECS")?
            .unwrap_or(DEFAULT_WAIT_TIME_SECS)
            .clamp(0, 20);
        let sqs_max_messages = clamp_max_messages(parse_env("SQS_MAX_MESSAGES")?.unwrap_or(DEFAULT_MAX_MESSAGES));

        let webhook_timeout = parse_env::<u64>("WEBHOOK_TIMEOUT_SECS")?.map(Duration::from_secs);

        Ok(Self {
            sheets,
            sqs_queue_url,
            sqs_wait_time_secs,
            sqs_max_messages,
            webhook_timeout,
        })
    }
}

/// Parse an optional numeric env var; a present but invalid value is an error
fn parse_env<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} must be a number, got '{}'", name, raw)),
        _ => Ok(None),
    }
}

fn clamp_max_messages(requested: i32) -> i32 {
    if !(1..=10).contains(&requested) {
        tracing::warn!("SQS_MAX_MESSAGES={} out of range, clamping to 1..=10", requested);
    }
    requested.clamp(1, 10)
}
