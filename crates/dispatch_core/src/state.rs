use chrono::{DateTime, Utc};
use dispatch_logging::dispatch_info;

use crate::{
    AppViewModel, AttachmentRef, ChatId, ChatMessage, ClientId, CorrelationTable, QueueJob,
    ServerId, Transcript,
};

/// Fixed delay between poll ticks.
pub const POLL_INTERVAL_MS: u64 = 1500;

/// Consecutive failed ticks tolerated before the poll loop disarms for the
/// session.
pub const POLL_FAILURE_CEILING: u8 = 5;

/// Whether the shared poll timer should be running. The timer handle
/// itself lives with the effect runner; arming and disarming are the only
/// transitions and are driven exclusively by `update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollState {
    #[default]
    Disarmed,
    Armed,
}

/// Session identity and model parameters, fixed for the life of the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub user_id: String,
    pub model: String,
    pub system_prompt: String,
    pub enable_search: bool,
    pub is_authenticated: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_id: "guest".to_owned(),
            model: "default".to_owned(),
            system_prompt: String::new(),
            enable_search: false,
            is_authenticated: false,
        }
    }
}

/// Everything a submission needs to leave the pure core: the effect runner
/// hands this to the engine verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SubmittedPrompt {
    pub client_id: ClientId,
    pub content: String,
    pub attachments: Vec<AttachmentRef>,
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    config: SessionConfig,
    chat_id: Option<ChatId>,
    draft: String,
    staged: Vec<AttachmentRef>,
    transcript: Transcript,
    jobs: CorrelationTable,
    poll: PollState,
    poll_failures: u8,
    degraded: bool,
    next_client_id: u64,
    dirty: bool,
}

impl AppState {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            chat_id: None,
            draft: String::new(),
            staged: Vec::new(),
            transcript: Transcript::new(),
            jobs: CorrelationTable::new(),
            poll: PollState::Disarmed,
            poll_failures: 0,
            degraded: false,
            next_client_id: 1,
            dirty: false,
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel::project(self)
    }

    /// Returns whether a state change happened since the last call, and
    /// resets the flag. The app uses this to coalesce rendering.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn chat_id(&self) -> Option<&ChatId> {
        self.chat_id.as_ref()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn jobs(&self) -> &CorrelationTable {
        &self.jobs
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn poll(&self) -> PollState {
        self.poll
    }

    pub fn degraded(&self) -> bool {
        self.degraded
    }

    pub(crate) fn set_draft(&mut self, text: String) {
        self.draft = text;
        self.dirty = true;
    }

    pub(crate) fn stage_attachment(&mut self, attachment: AttachmentRef) {
        self.staged.push(attachment);
        self.dirty = true;
    }

    /// Creates the queue job and its optimistic transcript entry as one
    /// logical step, consuming the draft and staged attachments. Returns
    /// `None` when the trimmed draft is empty.
    pub(crate) fn submit_draft(&mut self, now: DateTime<Utc>) -> Option<SubmittedPrompt> {
        let content = self.draft.trim().to_owned();
        if content.is_empty() {
            return None;
        }
        let client_id = ClientId(self.next_client_id);
        self.next_client_id += 1;

        let attachments = std::mem::take(&mut self.staged);
        self.draft.clear();

        let job = self.jobs.create(client_id, content, attachments, now);
        self.transcript.insert_optimistic(&job);
        self.dirty = true;

        Some(SubmittedPrompt {
            client_id,
            content: job.content,
            attachments: job.attachments,
            history: self.transcript.history(),
        })
    }

    pub(crate) fn adopt_chat(&mut self, chat_id: ChatId) {
        if self.chat_id.as_ref() != Some(&chat_id) {
            dispatch_info!("session now bound to chat {}", chat_id);
            self.chat_id = Some(chat_id);
            self.dirty = true;
        }
    }

    pub(crate) fn jobs_mut(&mut self) -> &mut CorrelationTable {
        self.dirty = true;
        &mut self.jobs
    }

    /// Removes both the correlation entry and the optimistic transcript
    /// entry for `client_id`. Idempotent on both sides.
    pub(crate) fn evict(&mut self, client_id: ClientId) -> Option<QueueJob> {
        let job = self.jobs.remove_by_client(client_id);
        self.transcript.evict_optimistic(client_id);
        self.dirty = true;
        job
    }

    /// Terminal eviction keyed by server id: reads the client id off the
    /// correlation entry, then removes entry and optimistic message.
    pub(crate) fn evict_by_server(&mut self, server_id: &ServerId) -> Option<QueueJob> {
        let client_id = self.jobs.find_by_server(server_id)?.client_id;
        self.evict(client_id)
    }

    pub(crate) fn outstanding_ids(&self) -> Vec<ServerId> {
        self.jobs
            .outstanding()
            .iter()
            .filter_map(|job| job.server_id.clone())
            .collect()
    }

    /// Arms the poll state machine when there is outstanding work and the
    /// loop is neither running nor degraded. Returns true on the
    /// Disarmed -> Armed transition, which is the runner's cue to start
    /// the timer.
    pub(crate) fn arm_poll(&mut self) -> bool {
        if self.degraded
            || self.poll == PollState::Armed
            || self.jobs.outstanding().is_empty()
        {
            return false;
        }
        self.poll = PollState::Armed;
        true
    }

    /// Disarms when no outstanding work remains. Returns true on the
    /// Armed -> Disarmed transition.
    pub(crate) fn disarm_poll_if_idle(&mut self) -> bool {
        if self.poll == PollState::Armed && self.jobs.outstanding().is_empty() {
            self.poll = PollState::Disarmed;
            return true;
        }
        false
    }

    /// Records one failed tick. Returns true exactly once, when the
    /// counter reaches the ceiling and the loop degrades for the session.
    pub(crate) fn record_poll_failure(&mut self) -> bool {
        if self.degraded {
            return false;
        }
        self.poll_failures = self.poll_failures.saturating_add(1);
        if self.poll_failures >= POLL_FAILURE_CEILING {
            self.degraded = true;
            self.poll = PollState::Disarmed;
            self.dirty = true;
            return true;
        }
        false
    }

    pub(crate) fn reset_poll_failures(&mut self) {
        self.poll_failures = 0;
    }

    /// Clears the degraded flag and failure counter; re-arms when
    /// outstanding jobs remain. Returns true when the timer should
    /// restart.
    pub(crate) fn resume_polling(&mut self) -> bool {
        if !self.degraded {
            return false;
        }
        self.degraded = false;
        self.poll_failures = 0;
        self.dirty = true;
        self.arm_poll()
    }

    pub(crate) fn replace_confirmed(&mut self, messages: Vec<ChatMessage>) {
        self.transcript.replace_confirmed(messages);
        self.dirty = true;
    }

    /// Discards all in-flight work for the previous chat. No server-side
    /// cancellation is attempted; results of in-flight requests will hit
    /// idempotent removals and be absorbed. Returns true when the timer
    /// was running and must be stopped.
    pub(crate) fn reset_session(&mut self, chat_id: Option<ChatId>) -> bool {
        let was_armed = self.poll == PollState::Armed;
        self.chat_id = chat_id;
        self.jobs.clear();
        self.transcript.clear();
        self.staged.clear();
        self.poll = PollState::Disarmed;
        self.poll_failures = 0;
        self.degraded = false;
        self.dirty = true;
        was_armed
    }
}
