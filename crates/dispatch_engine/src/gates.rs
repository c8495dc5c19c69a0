use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::transport::HttpQueueTransport;
use crate::types::{MessagesRequest, MessagesResponse, TransportError, WireAttachment, WireMessage};

const MESSAGES_PATH: &str = "/api/chat/messages";

/// Submission gate: may this user submit another prompt right now?
#[async_trait::async_trait]
pub trait RateLimiter: Send + Sync {
    async fn check(&self, user_id: &str) -> bool;
}

/// Submission gate: make sure a chat exists to attach the prompt to.
/// Returns the chat id, or `None` when no chat could be prepared.
#[async_trait::async_trait]
pub trait ChatBootstrap: Send + Sync {
    async fn ensure_chat(&self, user_id: &str, prompt: &str) -> Option<String>;
}

/// Submission gate: resolve staged attachments into uploaded descriptors.
/// `cleanup` releases uploads that ended up unused (enqueue failed after
/// the upload succeeded).
#[async_trait::async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn upload(
        &self,
        user_id: &str,
        chat_id: &str,
        staged: &[WireAttachment],
    ) -> Option<Vec<WireAttachment>>;

    async fn cleanup(&self, attachments: &[WireAttachment]);
}

/// The conversation layer the regeneration trigger pulls from.
#[async_trait::async_trait]
pub trait ConversationStore: Send + Sync {
    async fn fetch_messages(
        &self,
        request: &MessagesRequest,
    ) -> Result<Vec<WireMessage>, TransportError>;
}

#[async_trait::async_trait]
impl ConversationStore for HttpQueueTransport {
    async fn fetch_messages(
        &self,
        request: &MessagesRequest,
    ) -> Result<Vec<WireMessage>, TransportError> {
        let response: MessagesResponse = self.post(MESSAGES_PATH, request).await?;
        if !response.success {
            return Err(TransportError::Rejected(
                response
                    .error
                    .unwrap_or_else(|| "could not load messages".to_string()),
            ));
        }
        Ok(response.messages)
    }
}

/// Rate limiter that admits everything. Deployments with a real limit
/// plug in their own implementation.
#[derive(Debug, Default)]
pub struct UnlimitedRate;

#[async_trait::async_trait]
impl RateLimiter for UnlimitedRate {
    async fn check(&self, _user_id: &str) -> bool {
        true
    }
}

/// Chat bootstrap that mints ids locally, for deployments where the queue
/// backend does not manage chats itself.
#[derive(Debug, Default)]
pub struct LocalChatBootstrap {
    counter: AtomicU64,
}

#[async_trait::async_trait]
impl ChatBootstrap for LocalChatBootstrap {
    async fn ensure_chat(&self, user_id: &str, _prompt: &str) -> Option<String> {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        Some(format!("chat-{user_id}-{epoch_ms}-{seq}"))
    }
}

/// Attachment store that returns the staged descriptors unchanged, for
/// attachments that are already reachable by URL.
#[derive(Debug, Default)]
pub struct PassthroughUploads;

#[async_trait::async_trait]
impl AttachmentStore for PassthroughUploads {
    async fn upload(
        &self,
        _user_id: &str,
        _chat_id: &str,
        staged: &[WireAttachment],
    ) -> Option<Vec<WireAttachment>> {
        Some(staged.to_vec())
    }

    async fn cleanup(&self, _attachments: &[WireAttachment]) {}
}
