use std::fmt;

use chrono::{DateTime, Utc};

/// Locally generated submission identity, assigned before any network call
/// and stable for the job's entire lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Queue identity assigned by the server on a successful enqueue.
/// Write-once: the sole key used for polling and cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerId(pub String);

impl ServerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ServerId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of the conversation a job belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChatId(pub String);

impl From<&str> for ChatId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Local, coarse job status. Terminal states exist only transiently during
/// reconciliation and immediately remove the job from tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Processing,
}

/// Queue status as reported by the remote status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl RemoteStatus {
    /// Coarse local status for a job the server still holds.
    /// Terminal statuses have no local counterpart.
    pub fn as_local(self) -> Option<JobStatus> {
        match self {
            RemoteStatus::Pending => Some(JobStatus::Pending),
            RemoteStatus::Processing => Some(JobStatus::Processing),
            RemoteStatus::Completed | RemoteStatus::Failed | RemoteStatus::Cancelled => None,
        }
    }
}

/// Descriptor for a resolved attachment, immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub name: String,
    pub content_type: String,
    pub url: String,
}

/// One submitted prompt awaiting processing by the external worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueJob {
    pub client_id: ClientId,
    pub server_id: Option<ServerId>,
    pub status: JobStatus,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub attachments: Vec<AttachmentRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// A confirmed transcript entry, as returned by the conversation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub attachments: Vec<AttachmentRef>,
}
