//! Webhook delivery abstraction.
//!
//! `WebhookSender` is the core trait. `HttpWebhookSender` POSTs the records as
//! JSON in production, and `FakeWebhookSender` captures deliveries in tests.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::DeliveryError;
use crate::types::{ContactRecord, WebhookPayload};

// =============================================================================
// Core trait
// =============================================================================

/// Abstraction over the outbound webhook transport
#[async_trait]
pub trait WebhookSender: Send + Sync {
    async fn deliver(&self, url: &str, records: &[ContactRecord]) -> Result<(), DeliveryError>;
}

// =============================================================================
// HttpWebhookSender
// =============================================================================

pub struct HttpWebhookSender {
    client: reqwest::Client,
}

impl HttpWebhookSender {
    /// `timeout` of `None` leaves the request unbounded
    pub fn new(timeout: Option<Duration>) -> Self {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("sheet-relay-worker/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().expect("Failed to create HTTP client");

        Self { client }
    }
}

#[async_trait]
impl WebhookSender for HttpWebhookSender {
    async fn deliver(&self, url: &str, records: &[ContactRecord]) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(url)
            .json(&WebhookPayload { data: records })
            .send()
            .await
            .map_err(|source| DeliveryError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        debug!("Webhook {} accepted {} records ({})", url, records.len(), status);
        Ok(())
    }
}

// =============================================================================
// FakeWebhookSender (tests)
// =============================================================================

#[cfg(test)]
pub use fake::FakeWebhookSender;


// =============================================================================
// Tests
// =============================================================================
