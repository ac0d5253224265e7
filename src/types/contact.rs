//! Contact records produced by the sheet extractor

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// Email validity, derived from the email cell's background color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EmailStatus {
    #[serde(rename = "valid")]
    Valid,
    #[serde(rename = "catch-all")]
    CatchAll,
    #[serde(rename = "invalid")]
    Invalid,
}

impl EmailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailStatus::Valid => "valid",
            EmailStatus::CatchAll => "catch-all",
            EmailStatus::Invalid => "invalid",
        }
    }
}

/// One extracted table row.
///
/// Fixed fields default to an empty string. `email_status` stays unset when
/// the sheet has no "Email Address" column and serializes as `""`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContactRecord {
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    pub job_title: String,
    pub email: String,
    #[serde(serialize_with = "serialize_email_status")]
    pub email_status: Option<EmailStatus>,
    pub domain: String,
    /// Columns without a fixed field, keyed by header text in column order
    pub extra: IndexMap<String, Option<String>>,
}

fn serialize_email_status<S>(status: &Option<EmailStatus>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(status.map(|s| s.as_str()).unwrap_or(""))
}

/// Webhook request body
#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    pub data: &'a [ContactRecord],
}
