use chrono::Utc;
use dispatch_logging::{dispatch_debug, dispatch_info, dispatch_trace, dispatch_warn};

use crate::{AppState, Effect, JobStatus, Msg, NoticeStatus, RemoteStatus};

/// Pure update function: applies a message to state and returns any effects.
///
/// This is the single writer for the correlation table and the transcript;
/// timer ticks, engine events, and user actions all funnel through here.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::DraftChanged(text) => {
            dispatch_trace!("draft now {} chars", text.chars().count());
            state.set_draft(text);
            Vec::new()
        }
        Msg::AttachmentStaged(attachment) => {
            state.stage_attachment(attachment);
            Vec::new()
        }
        Msg::PromptSubmitted => {
            let Some(submission) = state.submit_draft(Utc::now()) else {
                return (state, Vec::new());
            };
            dispatch_info!(
                "submitting job {} ({} chars, {} attachments)",
                submission.client_id,
                submission.content.len(),
                submission.attachments.len()
            );
            vec![
                Effect::ClearDraft,
                Effect::Submit {
                    client_id: submission.client_id,
                    chat_id: state.chat_id().cloned(),
                    content: submission.content,
                    attachments: submission.attachments,
                    history: submission.history,
                },
            ]
        }
        Msg::Enqueued {
            client_id,
            server_id,
            status,
            chat_id,
        } => {
            // The job may have been cancelled or the session reset while
            // the enqueue round trip was in flight; the response must not
            // touch the current session.
            if state.jobs().get(client_id).is_none() {
                dispatch_warn!(
                    "enqueue response for {}: no longer tracked, dropping {}",
                    client_id,
                    server_id
                );
                return (state, Vec::new());
            }
            state.adopt_chat(chat_id.clone());
            let status = status.as_local().unwrap_or(JobStatus::Pending);
            state
                .jobs_mut()
                .attach_server_id(client_id, server_id, status);
            let mut effects = vec![Effect::BumpChat { chat_id }];
            if state.arm_poll() {
                effects.push(Effect::ArmPollTimer);
            }
            effects
        }
        Msg::SubmissionRejected { client_id, reason } => {
            dispatch_info!("submission {} rejected: {}", client_id, reason);
            state.evict(client_id);
            vec![Effect::Notify {
                title: reason,
                status: NoticeStatus::Error,
            }]
        }
        Msg::EnqueueFailed { client_id, message } => {
            dispatch_warn!("enqueue for {} failed: {}", client_id, message);
            state.evict(client_id);
            vec![Effect::Notify {
                title: message,
                status: NoticeStatus::Error,
            }]
        }
        Msg::PollTick => {
            if state.degraded() {
                return (state, Vec::new());
            }
            // Membership is read at tick time, never captured at arm time.
            let queue_ids = state.outstanding_ids();
            if queue_ids.is_empty() {
                if state.disarm_poll_if_idle() {
                    vec![Effect::DisarmPollTimer]
                } else {
                    Vec::new()
                }
            } else {
                vec![Effect::PollStatus { queue_ids }]
            }
        }
        Msg::PollCompleted { statuses } => {
            dispatch_debug!(
                "tick {}: reconciling {} statuses",
                dispatch_logging::get_poll_tick(),
                statuses.len()
            );
            state.reset_poll_failures();
            let mut effects = Vec::new();
            let mut completed = 0usize;
            for (server_id, status) in statuses {
                match status {
                    RemoteStatus::Pending => {}
                    RemoteStatus::Processing => {
                        state.jobs_mut().mark_processing(&server_id);
                    }
                    RemoteStatus::Completed => {
                        if state.evict_by_server(&server_id).is_some() {
                            completed += 1;
                        }
                    }
                    RemoteStatus::Failed => {
                        if state.evict_by_server(&server_id).is_some() {
                            effects.push(Effect::Notify {
                                title: "Message failed".to_owned(),
                                status: NoticeStatus::Error,
                            });
                        }
                    }
                    RemoteStatus::Cancelled => {
                        if state.evict_by_server(&server_id).is_some() {
                            effects.push(Effect::Notify {
                                title: "Message cancelled".to_owned(),
                                status: NoticeStatus::Info,
                            });
                        }
                    }
                }
            }
            // Evictions above are already applied, so the regenerated
            // result can never coexist with an optimistic placeholder.
            if completed > 0 {
                match state.chat_id().cloned() {
                    Some(chat_id) => effects.push(Effect::Regenerate { chat_id }),
                    None => dispatch_warn!("{} jobs completed with no bound chat", completed),
                }
            }
            if state.disarm_poll_if_idle() {
                effects.push(Effect::DisarmPollTimer);
            }
            effects
        }
        Msg::PollFailed => {
            if state.record_poll_failure() {
                dispatch_warn!("poll failure ceiling reached, disarming for this session");
                vec![
                    Effect::DisarmPollTimer,
                    Effect::Notify {
                        title: "Status updates paused after repeated errors".to_owned(),
                        status: NoticeStatus::Error,
                    },
                ]
            } else {
                Vec::new()
            }
        }
        Msg::CancelRequested { client_id } => {
            let Some(job) = state.jobs().get(client_id) else {
                dispatch_debug!("cancel for {}: not tracked", client_id);
                return (state, Vec::new());
            };
            if job.status == JobStatus::Processing {
                // The cancel control is absent for processing jobs; a
                // request that slips through is dropped.
                dispatch_warn!("cancel for {} ignored: already processing", client_id);
                return (state, Vec::new());
            }
            let server_id = job.server_id.clone();
            state.evict(client_id);
            let mut effects = Vec::new();
            if let Some(server_id) = server_id {
                effects.push(Effect::CancelJob { server_id });
            }
            if state.disarm_poll_if_idle() {
                effects.push(Effect::DisarmPollTimer);
            }
            effects
        }
        Msg::CancelFailed { message } => {
            // No rollback; the job is already gone from the user's view.
            vec![Effect::Notify {
                title: message,
                status: NoticeStatus::Error,
            }]
        }
        Msg::TranscriptRefreshed { chat_id, messages } => {
            // A regeneration fetch can outlive a chat switch; a result for
            // a chat this session no longer shows is discarded.
            if state.chat_id() != Some(&chat_id) {
                dispatch_info!("dropping transcript for {}: session has moved on", chat_id);
                return (state, Vec::new());
            }
            state.replace_confirmed(messages.clone());
            vec![Effect::SaveTranscript { messages }]
        }
        Msg::RestoreTranscript(messages) => {
            state.replace_confirmed(messages);
            Vec::new()
        }
        Msg::ChatSwitched { chat_id } => {
            let was_armed = state.reset_session(chat_id);
            if was_armed {
                vec![Effect::DisarmPollTimer]
            } else {
                Vec::new()
            }
        }
        Msg::PollResumeRequested => {
            if state.resume_polling() {
                dispatch_info!("polling resumed by user");
                vec![Effect::ArmPollTimer]
            } else {
                Vec::new()
            }
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
