//! Dispatch core: pure state machine for prompt queue submission and
//! reconciliation. All IO lives in `dispatch_engine`; this crate only maps
//! messages to state transitions and effects.
mod effect;
mod job;
mod msg;
mod state;
mod table;
mod transcript;
mod update;
mod view_model;

pub use effect::{Effect, NoticeStatus};
pub use job::{
    AttachmentRef, ChatId, ChatMessage, ClientId, JobStatus, QueueJob, RemoteStatus, Role,
    ServerId,
};
pub use msg::Msg;
pub use state::{AppState, PollState, SessionConfig, POLL_FAILURE_CEILING, POLL_INTERVAL_MS};
pub use table::CorrelationTable;
pub use transcript::{OptimisticMessage, Transcript};
pub use update::update;
pub use view_model::{AppViewModel, JobRowView, MessageRowView};
