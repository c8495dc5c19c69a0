#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the prompt input box.
    DraftChanged(String),
    /// User attached a file to the draft (already described, not uploaded).
    AttachmentStaged(crate::AttachmentRef),
    /// User submitted the current draft.
    PromptSubmitted,
    /// Engine: the enqueue round trip succeeded.
    Enqueued {
        client_id: crate::ClientId,
        server_id: crate::ServerId,
        status: crate::RemoteStatus,
        chat_id: crate::ChatId,
    },
    /// Engine: a submission gate rejected the prompt before any queue
    /// contact.
    SubmissionRejected {
        client_id: crate::ClientId,
        reason: String,
    },
    /// Engine: the queue refused the prompt or the request failed.
    EnqueueFailed {
        client_id: crate::ClientId,
        message: String,
    },
    /// Timer: one poll interval elapsed.
    PollTick,
    /// Engine: the batched status request round-tripped.
    PollCompleted {
        statuses: Vec<(crate::ServerId, crate::RemoteStatus)>,
    },
    /// Engine: the batched status request failed in transport or parse.
    PollFailed,
    /// User asked to cancel a still-pending job.
    CancelRequested { client_id: crate::ClientId },
    /// Engine: the best-effort remote cancel failed.
    CancelFailed { message: String },
    /// Engine: the conversation layer re-derived the message stream for
    /// `chat_id`.
    TranscriptRefreshed {
        chat_id: crate::ChatId,
        messages: Vec<crate::ChatMessage>,
    },
    /// Restore the confirmed transcript from the persisted cache.
    RestoreTranscript(Vec<crate::ChatMessage>),
    /// User switched conversations; discard all in-flight work.
    ChatSwitched { chat_id: Option<crate::ChatId> },
    /// User asked to resume polling after degraded-service shutdown.
    PollResumeRequested,
    /// Fallback for placeholder wiring.
    NoOp,
}
