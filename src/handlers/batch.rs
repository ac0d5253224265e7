//! Batch handler: queue records in, webhook deliveries out
//!
//! The whole batch is validated up front. A record from an unexpected source
//! or with an undecodable payload aborts the invocation before any sheet is
//! read. After that, each message is processed on its own. A missing sheet,
//! a missing header marker or a failed delivery is logged against its task id,
//! and the next message still runs.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{BatchError, MessageError};
use crate::services::extraction::{extract_records, locate_header, read_headers, HeaderLocation};
use crate::services::sheets::{SpreadsheetService, Worksheet};
use crate::services::webhook::WebhookSender;
use crate::types::{BatchMessage, QueueEvent, QueueRecord};

/// Outcome of one batch
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Task ids delivered, in processing order
    pub delivered: Vec<String>,
    pub failed: Vec<FailedTask>,
}

#[derive(Debug)]
pub struct FailedTask {
    pub task_id: String,
    pub reason: String,
}

pub struct BatchHandler {
    sheets: Arc<dyn SpreadsheetService>,
    webhook: Arc<dyn WebhookSender>,
}

impl BatchHandler {
    pub fn new(sheets: Arc<dyn SpreadsheetService>, webhook: Arc<dyn WebhookSender>) -> Self {
        Self { sheets, webhook }
    }

    /// Process every message of the batch in order
    pub async fn handle(&self, event: &QueueEvent) -> Result<BatchSummary, BatchError> {
        let batch_id = Uuid::new_v4();
        let messages = decode_batch(&event.records)?;
        info!("Batch {} accepted with {} messages", batch_id, messages.len());

        let mut summary = BatchSummary::default();
        for message in &messages {
            info!(
                task_id = %message.task_id,
                spreadsheet_id = %message.spreadsheet_id,
                sheet_id = %message.sheet_id,
                webhook = %message.webhook_url,
                "Received payload"
            );

            let started = Instant::now();
            match self.process_message(message).await {
                Ok(count) => {
                    info!(
                        "Successfully posted to webhook. Task ID: {} ({} records in {}ms)",
                        message.task_id,
                        count,
                        started.elapsed().as_millis()
                    );
                    summary.delivered.push(message.task_id.clone());
                }
                Err(e) => {
                    match &e {
                        MessageError::Delivery(_) => error!(
                            "Couldn't post to webhook. Task ID: {}. Error: {}",
                            message.task_id, e
                        ),
                        _ => warn!("Skipping task {}: {}", message.task_id, e),
                    }
                    summary.failed.push(FailedTask {
                        task_id: message.task_id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(summary)
    }

    /// Extract the contact table for one message and deliver it
    async fn process_message(&self, message: &BatchMessage) -> Result<usize, MessageError> {
        let mut sheet =
            Worksheet::open(Arc::clone(&self.sheets), &message.spreadsheet_id, &message.sheet_id).await?;

        let (key_column, header_row) = match locate_header(&mut sheet).await? {
            HeaderLocation::Found { column, row } => (column, row),
            HeaderLocation::NotFound => return Err(MessageError::HeaderNotFound),
        };

        let headers = read_headers(&mut sheet, header_row).await?;
        let row_count = sheet.row_count();
        let records = extract_records(&mut sheet, &headers, key_column, header_row + 1, row_count).await?;
        debug!(
            "Extracted {} records from '{}' using {} headers",
            records.len(),
            sheet.properties().title,
            headers.len()
        );

        self.webhook.deliver(&message.webhook_url, &records).await?;
        Ok(records.len())
    }
}

/// Check every record's source, then decode every payload
pub fn decode_batch(records: &[QueueRecord]) -> Result<Vec<BatchMessage>, BatchError> {
    if let Some(record) = records.iter().find(|record| !record.is_from_sqs()) {
        return Err(BatchError::UnexpectedEventSource(record.event_source.clone()));
    }

    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            record
                .decode_message()
                .map_err(|source| BatchError::MalformedPayload { index, source })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sheets::memory::{MemorySheet, MemorySpreadsheetService};
    use crate::services::webhook::FakeWebhookSender;
    use crate::types::{CellColor, SQS_EVENT_SOURCE};

    fn record(task_id: &str, spreadsheet_id: &str, sheet_id: &str, webhook: &str) -> QueueRecord {
        let message = serde_json::json!({
            "task_id": task_id,
            "spreadsheet_id": spreadsheet_id,
            "sheet_id": sheet_id,
            "webhook": webhook,
        });
        let body = serde_json::json!({ "Type": "Notification", "Message": message.to_string() });

        QueueRecord {
            message_id: Some(format!("msg-{}", task_id)),
            receipt_handle: None,
            event_source: SQS_EVENT_SOURCE.to_string(),
            body: body.to_string(),
        }
    }

    fn event(records: Vec<QueueRecord>) -> QueueEvent {
        QueueEvent { records }
    }

    /// Header row at row 0 with the marker in column B
    fn contact_sheet() -> MemorySheet {
        MemorySheet::new(20, 6)
            .with_row(0, &["First Name", "company_name", "Email Address", "Region"])
            .with_row(1, &["Ann", "Acme", "ann@acme.com", "East"])
            .with_background(1, 2, CellColor::rgb(1.0, 0.0, 0.0))
    }

    fn handler(
        sheets: MemorySpreadsheetService,
        webhook: FakeWebhookSender,
    ) -> (BatchHandler, Arc<MemorySpreadsheetService>, Arc<FakeWebhookSender>) {
        let sheets = Arc::new(sheets);
        let webhook = Arc::new(webhook);
        let handler = BatchHandler::new(sheets.clone(), webhook.clone());
        (handler, sheets, webhook)
    }

    // ==========================================================================
    // End-to-end
    // ==========================================================================

    #[tokio::test]
    async fn delivers_extracted_records() {
        let (handler, _, webhook) = handler(
            MemorySpreadsheetService::new().with_sheet("doc", "0", contact_sheet()),
            FakeWebhookSender::new(),
        );

        let summary = handler
            .handle(&event(vec![record("t-1", "doc", "0", "https://hook/a")]))
            .await
            .unwrap();

        assert_eq!(summary.delivered, vec!["t-1"]);
        assert!(summary.failed.is_empty());

        let deliveries = webhook.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].0, "https://hook/a");
        assert_eq!(
            deliveries[0].1,
            serde_json::json!({
                "data": [{
                    "first_name": "Ann",
                    "last_name": "",
                    "company_name": "Acme",
                    "job_title": "",
                    "email": "ann@acme.com",
                    "email_status": "invalid",
                    "domain": "",
                    "extra": { "Region": "East" }
                }]
            })
        );
    }

    #[tokio::test]
    async fn delivers_empty_data_when_table_has_no_rows() {
        let sheet = MemorySheet::new(10, 3).with_row(4, &["company_name", "Notes"]);
        let (handler, _, webhook) = handler(
            MemorySpreadsheetService::new().with_sheet("doc", "0", sheet),
            FakeWebhookSender::new(),
        );

        let summary = handler
            .handle(&event(vec![record("t-1", "doc", "0", "https://hook/a")]))
            .await
            .unwrap();

        assert_eq!(summary.delivered.len(), 1);
        assert_eq!(webhook.deliveries()[0].1, serde_json::json!({ "data": [] }));
    }

    // ==========================================================================
    // Per-message isolation
    // ==========================================================================

    #[tokio::test]
    async fn delivery_failure_does_not_stop_next_message() {
        let (handler, _, webhook) = handler(
            MemorySpreadsheetService::new().with_sheet("doc", "0", contact_sheet()),
            FakeWebhookSender::new().failing_on("https://hook/down"),
        );

        let summary = handler
            .handle(&event(vec![
                record("a", "doc", "0", "https://hook/down"),
                record("b", "doc", "0", "https://hook/up"),
            ]))
            .await
            .unwrap();

        assert_eq!(summary.delivered, vec!["b"]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].task_id, "a");

        let deliveries = webhook.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].0, "https://hook/up");
    }

    #[tokio::test]
    async fn missing_header_marker_skips_only_that_message() {
        let no_marker = MemorySheet::new(200, 12).with_text(150, 0, "company_name");
        let (handler, _, webhook) = handler(
            MemorySpreadsheetService::new()
                .with_sheet("doc", "0", contact_sheet())
                .with_sheet("doc", "9", no_marker),
            FakeWebhookSender::new(),
        );

        let summary = handler
            .handle(&event(vec![
                record("a", "doc", "9", "https://hook/a"),
                record("b", "doc", "0", "https://hook/b"),
            ]))
            .await
            .unwrap();

        assert_eq!(summary.delivered, vec!["b"]);
        assert_eq!(summary.failed[0].task_id, "a");
        assert!(summary.failed[0].reason.contains("company_name"));
        assert_eq!(webhook.deliveries().len(), 1);
    }

    #[tokio::test]
    async fn unknown_worksheet_skips_only_that_message() {
        let (handler, _, webhook) = handler(
            MemorySpreadsheetService::new().with_sheet("doc", "0", contact_sheet()),
            FakeWebhookSender::new(),
        );

        let summary = handler
            .handle(&event(vec![
                record("a", "other-doc", "0", "https://hook/a"),
                record("b", "doc", "0", "https://hook/b"),
            ]))
            .await
            .unwrap();

        assert_eq!(summary.delivered, vec!["b"]);
        assert_eq!(summary.failed[0].task_id, "a");
        assert_eq!(webhook.deliveries().len(), 1);
    }

    // ==========================================================================
    // Fatal batch errors
    // ==========================================================================

    #[tokio::test]
    async fn wrong_event_source_aborts_before_processing() {
        let mut foreign = record("b", "doc", "0", "https://hook/b");
        foreign.event_source = "aws:kinesis".to_string();
        let (handler, sheets, webhook) = handler(
            MemorySpreadsheetService::new().with_sheet("doc", "0", contact_sheet()),
            FakeWebhookSender::new(),
        );

        let result = handler
            .handle(&event(vec![record("a", "doc", "0", "https://hook/a"), foreign]))
            .await;

        match result {
            Err(BatchError::UnexpectedEventSource(source)) => assert_eq!(source, "aws:kinesis"),
            other => panic!("expected event source error, got {:?}", other),
        }
        assert!(sheets.fetched_ranges().is_empty());
        assert!(webhook.deliveries().is_empty());
    }

    #[tokio::test]
    async fn malformed_payload_aborts_batch() {
        let mut broken = record("b", "doc", "0", "https://hook/b");
        broken.body = r#"{"Message": "{\"task_id\": 1"}"#.to_string();
        let (handler, _, webhook) = handler(
            MemorySpreadsheetService::new().with_sheet("doc", "0", contact_sheet()),
            FakeWebhookSender::new(),
        );

        let result = handler
            .handle(&event(vec![record("a", "doc", "0", "https://hook/a"), broken]))
            .await;

        assert!(matches!(result, Err(BatchError::MalformedPayload { index: 1, .. })));
        assert!(webhook.deliveries().is_empty());
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let (handler, _, webhook) = handler(MemorySpreadsheetService::new(), FakeWebhookSender::new());

        let summary = handler.handle(&QueueEvent::default()).await.unwrap();

        assert!(summary.delivered.is_empty());
        assert!(summary.failed.is_empty());
        assert!(webhook.deliveries().is_empty());
    }
}
