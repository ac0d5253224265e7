//! SQS long-poll consumer
//!
//! Receives up to ten messages at a time and hands them to the batch handler
//! as one batch. Messages are deleted only when the batch completes. A fatal
//! batch error leaves them on the queue, and the visibility timeout then
//! redelivers them.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use aws_sdk_sqs::types::Message;
use futures::future::join_all;
use tracing::{error, info, warn};

use crate::handlers::BatchHandler;
use crate::types::{QueueEvent, QueueRecord, SQS_EVENT_SOURCE};

const RECEIVE_BACKOFF: Duration = Duration::from_secs(5);

/// Poller settings
#[derive(Debug, Clone)]
pub struct SqsPollerConfig {
    pub queue_url: String,
    pub wait_time_secs: i32,
    pub max_messages: i32,
}

pub struct SqsPoller {
    client: aws_sdk_sqs::Client,
    config: SqsPollerConfig,
    handler: Arc<BatchHandler>,
}

impl SqsPoller {
    /// Create a poller using the default AWS credential chain
    pub async fn new(config: SqsPollerConfig, handler: Arc<BatchHandler>) -> Self {
        let aws_config = aws_config::load_from_env().await;
        let client = aws_sdk_sqs::Client::new(&aws_config);

        Self {
            client,
            config,
            handler,
        }
    }

    /// Poll until Ctrl-C. A batch that is already being handled runs to
    /// completion first.
    pub async fn run(&self) -> Result<()> {
        info!("Polling SQS queue {}", self.config.queue_url);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            let received = tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping SQS poller");
                    break;
                }
                received = self.receive() => received,
            };

            match received {
                Ok(messages) if messages.is_empty() => {}
                Ok(messages) => self.process(&messages).await,
                Err(e) => {
                    error!("Error receiving SQS messages: {:#}", e);
                    tokio::time::sleep(RECEIVE_BACKOFF).await;
                }
            }
        }

        Ok(())
    }

    async fn receive(&self) -> Result<Vec<Message>> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.config.queue_url)
            .max_number_of_messages(self.config.max_messages)
            .wait_time_seconds(self.config.wait_time_secs)
            .send()
            .await
            .context("Failed to receive SQS messages")?;

        Ok(output.messages().to_vec())
    }

    async fn process(&self, messages: &[Message]) {
        let event = to_queue_event(messages);

        match self.handler.handle(&event).await {
            Ok(summary) => {
                info!(
                    "Batch of {} finished: {} delivered, {} failed",
                    event.records.len(),
                    summary.delivered.len(),
                    summary.failed.len()
                );
                self.delete(&event.records).await;
            }
            Err(e) => {
                error!(
                    "Batch aborted, leaving {} messages for redelivery: {}",
                    event.records.len(),
                    e
                );
            }
        }
    }

    async fn delete(&self, records: &[QueueRecord]) {
        let deletes = records
            .iter()
            .filter_map(|record| record.receipt_handle.as_deref())
            .map(|receipt_handle| {
                self.client
                    .delete_message()
                    .queue_url(&self.config.queue_url)
                    .receipt_handle(receipt_handle)
                    .send()
            });

        for result in join_all(deletes).await {
            if let Err(e) = result {
                warn!("Failed to delete SQS message: {}", e);
            }
        }
    }
}

/// Wrap received SQS messages in the Lambda event shape
pub fn to_queue_event(messages: &[Message]) -> QueueEvent {
    QueueEvent {
        records: messages
            .iter()
            .map(|message| QueueRecord {
                message_id: message.message_id().map(str::to_string),
                receipt_handle: message.receipt_handle().map(str::to_string),
                event_source: SQS_EVENT_SOURCE.to_string(),
                body: message.body().unwrap_or_default().to_string(),
            })
            .collect(),
    }
}
