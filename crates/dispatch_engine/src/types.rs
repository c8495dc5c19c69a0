use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ceiling on prompt length, in characters. The length gate rejects longer
/// prompts before any queue contact.
pub const MAX_PROMPT_CHARS: usize = 4000;

/// Shown when the queue refuses a prompt without a usable error message.
pub const ENQUEUE_FALLBACK_ERROR: &str = "The queue could not accept this message";

/// Queue status as carried on the wire by all three endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

/// Attachment descriptor as the queue endpoints expect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAttachment {
    pub name: String,
    pub content_type: String,
    pub url: String,
}

/// One transcript message as the queue endpoints expect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<WireAttachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueRequest {
    pub user_id: String,
    pub chat_id: String,
    pub model: String,
    pub is_authenticated: bool,
    pub system_prompt: String,
    pub enable_search: bool,
    pub messages: Vec<WireMessage>,
    pub attachments: Vec<WireAttachment>,
}

/// Server id and status pair, returned by the enqueue and status endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueHandle {
    pub id: String,
    pub status: QueueStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnqueueResponse {
    pub success: bool,
    #[serde(default)]
    pub queue: Option<QueueHandle>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub user_id: String,
    pub is_authenticated: bool,
    pub queue_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    #[serde(default)]
    pub queue: Vec<QueueHandle>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub queue_id: String,
    pub user_id: String,
    pub is_authenticated: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesRequest {
    pub user_id: String,
    pub chat_id: String,
    pub is_authenticated: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    pub success: bool,
    #[serde(default)]
    pub messages: Vec<WireMessage>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Failure of one request round trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("timeout")]
    Timeout,
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The endpoint answered `success: false`; carries the server message.
    #[error("{0}")]
    Rejected(String),
}

/// A submission gate refused the prompt. Handled entirely at the
/// submission pipeline; never propagated to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GateRejection {
    #[error("Rate limit reached")]
    RateLimited,
    #[error("Could not prepare a chat for this message")]
    ChatUnavailable,
    #[error("Message is too long")]
    TooLong,
    #[error("Attachment upload failed")]
    UploadFailed,
}
