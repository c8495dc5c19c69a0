//! Dispatch engine: IO pipeline and effect execution for the prompt queue.
mod cache;
mod engine;
mod gates;
mod submit;
mod transport;
mod types;

pub use cache::{ensure_cache_dir, CacheError, SnapshotStore};
pub use engine::{EngineConfig, EngineEvent, EngineHandle, EngineIdentity};
pub use gates::{
    AttachmentStore, ChatBootstrap, ConversationStore, LocalChatBootstrap, PassthroughUploads,
    RateLimiter, UnlimitedRate,
};
pub use transport::{HttpQueueTransport, QueueTransport, TransportSettings};
pub use types::{
    CancelRequest, CancelResponse, EnqueueRequest, EnqueueResponse, GateRejection,
    MessagesRequest, MessagesResponse, QueueHandle, QueueStatus, StatusRequest, StatusResponse,
    TransportError, WireAttachment, WireMessage, ENQUEUE_FALLBACK_ERROR, MAX_PROMPT_CHARS,
};
