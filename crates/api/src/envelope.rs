//! JSON response envelope used by the REST API
//!
//! Every JSON endpoint wraps its payload as
//! `{"success": bool, "errors": [...], "messages": [...], "result": ...}`.

use serde::Deserialize;

/// A single error or informational message
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: i64,
    pub message: String,
}

/// Response envelope
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    #[serde(default)]
    pub messages: Vec<ApiMessage>,
    pub result: Option<T>,
}

impl<T> Envelope<T> {
    /// All error messages joined into one line
    pub fn error_summary(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(|e| format!("{} [code: {}]", e.message, e.code))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Extract the error summary from a raw response body, if it is an envelope
pub fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<Envelope<serde_json::Value>>(body)
        .ok()?
        .error_summary()
}

/// Payload of the bucket list endpoint
#[derive(Debug, Deserialize)]
pub struct BucketList {
    #[serde(default)]
    pub buckets: Vec<BucketEntry>,
}

#[derive(Debug, Deserialize)]
pub struct BucketEntry {
    pub name: String,
    #[serde(default)]
    pub creation_date: Option<String>,
}
