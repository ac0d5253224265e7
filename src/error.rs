//! Error types for batch, message and spreadsheet processing

/// Errors that abort a whole batch invocation
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Unexpected event source: {0}")]
    UnexpectedEventSource(String),

    #[error("Malformed payload in record {index}: {source}")]
    MalformedPayload {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that fail a single message; the batch carries on
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Spreadsheet error: {0}")]
    Sheet(#[from] SheetError),

    #[error("Header marker \"company_name\" not found in A1:L100")]
    HeaderNotFound,

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Spreadsheet service errors
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sheets API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Worksheet {sheet_id} not found in spreadsheet {spreadsheet_id}")]
    WorksheetNotFound {
        spreadsheet_id: String,
        sheet_id: String,
    },

    #[error("Cell at row {row}, column {column} read before it was loaded")]
    CellNotLoaded { row: u32, column: u32 },

    #[error("Invalid range: {0}")]
    InvalidRange(String),
}

/// Webhook delivery errors
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Webhook {url} responded with status {status}")]
    Status { url: String, status: u16 },
}
