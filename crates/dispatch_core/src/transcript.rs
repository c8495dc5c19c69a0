use chrono::{DateTime, Utc};
use dispatch_logging::dispatch_warn;

use crate::{AttachmentRef, ChatMessage, ClientId, QueueJob, Role};

/// A transcript entry rendered before server confirmation, keyed by the
/// submitting job's client id. Removed exactly once on any terminal
/// outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimisticMessage {
    pub client_id: ClientId,
    pub content: String,
    pub attachments: Vec<AttachmentRef>,
    pub created_at: DateTime<Utc>,
}

/// The visible conversation: confirmed messages from the conversation
/// layer, followed by optimistic entries in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transcript {
    confirmed: Vec<ChatMessage>,
    optimistic: Vec<OptimisticMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the synthetic entry for a freshly created job.
    pub(crate) fn insert_optimistic(&mut self, job: &QueueJob) {
        if self.optimistic.iter().any(|m| m.client_id == job.client_id) {
            dispatch_warn!("optimistic entry for {} already present", job.client_id);
            return;
        }
        self.optimistic.push(OptimisticMessage {
            client_id: job.client_id,
            content: job.content.clone(),
            attachments: job.attachments.clone(),
            created_at: job.created_at,
        });
    }

    /// Removes the optimistic entry for `client_id` if present. Evicting
    /// twice is a no-op.
    pub(crate) fn evict_optimistic(&mut self, client_id: ClientId) -> bool {
        let before = self.optimistic.len();
        self.optimistic.retain(|m| m.client_id != client_id);
        self.optimistic.len() != before
    }

    /// Replaces the confirmed portion with what the conversation layer now
    /// holds. Optimistic entries are untouched; their jobs are still
    /// outstanding.
    pub(crate) fn replace_confirmed(&mut self, messages: Vec<ChatMessage>) {
        self.confirmed = messages;
    }

    pub(crate) fn clear(&mut self) {
        self.confirmed.clear();
        self.optimistic.clear();
    }

    /// The full message history as the enqueue endpoint expects it:
    /// confirmed messages followed by optimistic ones as user turns.
    pub fn history(&self) -> Vec<ChatMessage> {
        let mut messages = self.confirmed.clone();
        messages.extend(self.optimistic.iter().map(|m| ChatMessage {
            role: Role::User,
            content: m.content.clone(),
            attachments: m.attachments.clone(),
        }));
        messages
    }

    pub fn confirmed(&self) -> &[ChatMessage] {
        &self.confirmed
    }

    pub fn optimistic(&self) -> &[OptimisticMessage] {
        &self.optimistic
    }

    pub fn len(&self) -> usize {
        self.confirmed.len() + self.optimistic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.confirmed.is_empty() && self.optimistic.is_empty()
    }
}
