//! Queue envelope and batch message types

use serde::{Deserialize, Deserializer, Serialize};

/// Event source tag carried by every SQS record
pub const SQS_EVENT_SOURCE: &str = "aws:sqs";

/// A batch of queue records, in the shape of a Lambda SQS event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<QueueRecord>,
}

/// One queue record (envelope)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRecord {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub receipt_handle: Option<String>,
    #[serde(default)]
    pub event_source: String,
    pub body: String,
}

impl QueueRecord {
    /// Unwrap the notification body and decode the batch message it carries.
    ///
    /// The body is a JSON notification whose `Message` field is itself a JSON
    /// string holding the [`BatchMessage`].
    pub fn decode_message(&self) -> Result<BatchMessage, serde_json::Error> {
        let notification: Notification = serde_json::from_str(&self.body)?;
        serde_json::from_str(&notification.message)
    }

    pub fn is_from_sqs(&self) -> bool {
        self.event_source == SQS_EVENT_SOURCE
    }
}

#[derive(Debug, Deserialize)]
struct Notification {
    #[serde(rename = "Message")]
    message: String,
}

/// Unit of work: which sheet to read and where to send the result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchMessage {
    #[serde(alias = "taskId")]
    pub task_id: String,
    #[serde(alias = "spreadsheetId")]
    pub spreadsheet_id: String,
    #[serde(alias = "sheetId", deserialize_with = "string_or_number")]
    pub sheet_id: String,
    #[serde(rename = "webhook", alias = "webhookUrl")]
    pub webhook_url: String,
}

/// Sheet ids are numeric gids; producers send them either quoted or bare.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(serde_json::Number),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_body(body: &str) -> QueueRecord {
        QueueRecord {
            message_id: None,
            receipt_handle: None,
            event_source: SQS_EVENT_SOURCE.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_decode_message_unwraps_notification() {
        let inner = r#"{"task_id":"t-1","spreadsheet_id":"abc","sheet_id":"0","webhook":"https://hook.example.com/x"}"#;
        let body = serde_json::json!({ "Type": "Notification", "Message": inner }).to_string();

        let message = record_with_body(&body).decode_message().unwrap();

        assert_eq!(message.task_id, "t-1");
        assert_eq!(message.spreadsheet_id, "abc");
        assert_eq!(message.sheet_id, "0");
        assert_eq!(message.webhook_url, "https://hook.example.com/x");
    }

    #[test]
    fn test_decode_message_accepts_camel_case_and_numeric_sheet_id() {
        let inner = r#"{"taskId":"t-2","spreadsheetId":"abc","sheetId":1234,"webhookUrl":"https://h"}"#;
        let body = serde_json::json!({ "Message": inner }).to_string();

        let message = record_with_body(&body).decode_message().unwrap();

        assert_eq!(message.task_id, "t-2");
        assert_eq!(message.sheet_id, "1234");
        assert_eq!(message.webhook_url, "https://h");
    }

    #[test]
    fn test_decode_message_rejects_body_without_message() {
        let result = record_with_body(r#"{"task_id":"t-3"}"#).decode_message();
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_message_rejects_non_json_body() {
        assert!(record_with_body("not json").decode_message().is_err());
    }

    #[test]
    fn test_queue_event_parses_lambda_shape() {
        let raw = r#"{
            "Records": [
                {"messageId": "m-1", "receiptHandle": "rh", "eventSource": "aws:sqs", "body": "{}", "awsRegion": "eu-west-1"}
            ]
        }"#;

        let event: QueueEvent = serde_json::from_str(raw).unwrap();

        assert_eq!(event.records.len(), 1);
        assert!(event.records[0].is_from_sqs());
        assert_eq!(event.records[0].message_id.as_deref(), Some("m-1"));
    }

    #[test]
    fn test_batch_message_serializes_with_wire_names() {
        let message = BatchMessage {
            task_id: "t".into(),
            spreadsheet_id: "s".into(),
            sheet_id: "0".into(),
            webhook_url: "https://h".into(),
        };

        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["webhook"], "https://h");
        assert_eq!(json["task_id"], "t");
    }
}
