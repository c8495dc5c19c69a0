#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Run the submission pipeline (gates, then enqueue) for a new job.
    Submit {
        client_id: crate::ClientId,
        chat_id: Option<crate::ChatId>,
        content: String,
        attachments: Vec<crate::AttachmentRef>,
        history: Vec<crate::ChatMessage>,
    },
    /// Issue one batched status request for all outstanding server ids.
    PollStatus { queue_ids: Vec<crate::ServerId> },
    /// Best-effort remote cancel; local state is already gone.
    CancelJob { server_id: crate::ServerId },
    /// Ask the conversation layer to pull what the worker has produced.
    /// Fired at most once per poll tick.
    Regenerate { chat_id: crate::ChatId },
    /// Start the shared poll timer.
    ArmPollTimer,
    /// Stop the shared poll timer.
    DisarmPollTimer,
    /// Clear any persisted draft for this chat.
    ClearDraft,
    /// Move the chat to the top of the recent-chats list.
    BumpChat { chat_id: crate::ChatId },
    /// Show a short user-visible notice.
    Notify {
        title: String,
        status: NoticeStatus,
    },
    /// Refresh the on-disk transcript cache.
    SaveTranscript { messages: Vec<crate::ChatMessage> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeStatus {
    Info,
    Error,
}
