use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use dispatch_core::{
    AttachmentRef, ChatId, ChatMessage, ClientId, Effect, Msg, NoticeStatus, RemoteStatus, Role,
    ServerId, POLL_INTERVAL_MS,
};
use dispatch_engine::{
    EngineConfig, EngineEvent, EngineHandle, QueueStatus, WireAttachment, WireMessage,
};
use dispatch_logging::{dispatch_info, dispatch_warn};

use crate::persistence;

/// Executes core effects against the engine and owns the shared poll
/// timer. At most one timer thread exists at a time; `ArmPollTimer` and
/// `DisarmPollTimer` are its only controls.
pub struct EffectRunner {
    engine: EngineHandle,
    msg_tx: mpsc::Sender<Msg>,
    poll_timer: Option<PollTimer>,
    poll_ticks: u64,
    cache_dir: PathBuf,
}

struct PollTimer {
    stop: Arc<AtomicBool>,
}

impl EffectRunner {
    pub fn new(config: EngineConfig, msg_tx: mpsc::Sender<Msg>, cache_dir: PathBuf) -> Self {
        Self {
            engine: EngineHandle::new(config),
            msg_tx,
            poll_timer: None,
            poll_ticks: 0,
            cache_dir,
        }
    }

    /// Collects everything the engine has reported since the last call,
    /// mapped onto core messages.
    pub fn drain_events(&self) -> Vec<Msg> {
        let mut msgs = Vec::new();
        while let Some(event) = self.engine.try_recv() {
            msgs.push(map_event(event));
        }
        msgs
    }

    pub fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Submit {
                    client_id,
                    chat_id,
                    content,
                    attachments,
                    history,
                } => {
                    self.engine.submit(
                        client_id.0,
                        chat_id.map(|chat| chat.0),
                        content,
                        attachments.iter().map(wire_attachment).collect(),
                        history.iter().map(wire_message).collect(),
                    );
                }
                Effect::PollStatus { queue_ids } => {
                    self.poll_ticks += 1;
                    dispatch_logging::set_poll_tick(self.poll_ticks);
                    self.engine
                        .fetch_status(queue_ids.into_iter().map(|id| id.0).collect());
                }
                Effect::CancelJob { server_id } => {
                    self.engine.cancel(server_id.0);
                }
                Effect::Regenerate { chat_id } => {
                    self.engine.regenerate(chat_id.0);
                }
                Effect::ArmPollTimer => self.arm_timer(),
                Effect::DisarmPollTimer => self.disarm_timer(),
                Effect::ClearDraft => {
                    persistence::clear_draft(&self.cache_dir);
                }
                Effect::BumpChat { chat_id } => {
                    // The CLI shows a single chat; there is no recent list
                    // to reorder.
                    dispatch_info!("chat {} bumped", chat_id);
                }
                Effect::Notify { title, status } => {
                    match status {
                        NoticeStatus::Error => eprintln!("!! {title}"),
                        NoticeStatus::Info => println!("-- {title}"),
                    }
                    dispatch_info!("notice ({:?}): {}", status, title);
                }
                Effect::SaveTranscript { messages } => {
                    persistence::save_transcript(&self.cache_dir, &messages);
                }
            }
        }
    }

    fn arm_timer(&mut self) {
        if self.poll_timer.is_some() {
            dispatch_warn!("poll timer already armed");
            return;
        }
        let stop = Arc::new(AtomicBool::new(false));
        let timer_stop = stop.clone();
        let msg_tx = self.msg_tx.clone();
        thread::spawn(move || {
            let interval = Duration::from_millis(POLL_INTERVAL_MS);
            loop {
                thread::sleep(interval);
                if timer_stop.load(Ordering::SeqCst) {
                    break;
                }
                if msg_tx.send(Msg::PollTick).is_err() {
                    break;
                }
            }
        });
        self.poll_timer = Some(PollTimer { stop });
        dispatch_info!("poll timer armed ({} ms)", POLL_INTERVAL_MS);
    }

    fn disarm_timer(&mut self) {
        if let Some(timer) = self.poll_timer.take() {
            timer.stop.store(true, Ordering::SeqCst);
            dispatch_info!("poll timer disarmed");
        }
    }
}

pub(crate) fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Enqueued {
            client_id,
            server_id,
            status,
            chat_id,
        } => Msg::Enqueued {
            client_id: ClientId(client_id),
            server_id: ServerId(server_id),
            status: map_status(status),
            chat_id: ChatId(chat_id),
        },
        EngineEvent::SubmissionRejected { client_id, reason } => Msg::SubmissionRejected {
            client_id: ClientId(client_id),
            reason: reason.to_string(),
        },
        EngineEvent::EnqueueFailed { client_id, message } => Msg::EnqueueFailed {
            client_id: ClientId(client_id),
            message,
        },
        EngineEvent::StatusFetched { statuses } => Msg::PollCompleted {
            statuses: statuses
                .into_iter()
                .map(|(id, status)| (ServerId(id), map_status(status)))
                .collect(),
        },
        EngineEvent::StatusFetchFailed { message } => {
            dispatch_warn!("poll tick failed: {}", message);
            Msg::PollFailed
        }
        EngineEvent::CancelFailed { queue_id, message } => {
            dispatch_warn!("remote cancel of {} failed", queue_id);
            Msg::CancelFailed { message }
        }
        EngineEvent::TranscriptFetched { chat_id, messages } => {
            dispatch_info!("transcript refreshed for chat {}", chat_id);
            Msg::TranscriptRefreshed {
                chat_id: ChatId(chat_id),
                messages: messages.into_iter().map(core_message).collect(),
            }
        }
    }
}

fn map_status(status: QueueStatus) -> RemoteStatus {
    match status {
        QueueStatus::Pending => RemoteStatus::Pending,
        QueueStatus::Processing => RemoteStatus::Processing,
        QueueStatus::Completed => RemoteStatus::Completed,
        QueueStatus::Failed => RemoteStatus::Failed,
        QueueStatus::Cancelled => RemoteStatus::Cancelled,
    }
}

fn wire_attachment(attachment: &AttachmentRef) -> WireAttachment {
    WireAttachment {
        name: attachment.name.clone(),
        content_type: attachment.content_type.clone(),
        url: attachment.url.clone(),
    }
}

fn wire_message(message: &ChatMessage) -> WireMessage {
    WireMessage {
        role: match message.role {
            Role::User => "user".to_owned(),
            Role::Assistant => "assistant".to_owned(),
        },
        content: message.content.clone(),
        attachments: message.attachments.iter().map(wire_attachment).collect(),
    }
}

fn core_message(message: WireMessage) -> ChatMessage {
    ChatMessage {
        role: if message.role.eq_ignore_ascii_case("assistant") {
            Role::Assistant
        } else {
            Role::User
        },
        content: message.content,
        attachments: message
            .attachments
            .into_iter()
            .map(|a| AttachmentRef {
                name: a.name,
                content_type: a.content_type,
                url: a.url,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueued_event_maps_onto_core_identifiers() {
        let msg = map_event(EngineEvent::Enqueued {
            client_id: 7,
            server_id: "q7".to_owned(),
            status: QueueStatus::Processing,
            chat_id: "chat-1".to_owned(),
        });
        assert_eq!(
            msg,
            Msg::Enqueued {
                client_id: ClientId(7),
                server_id: ServerId::from("q7"),
                status: RemoteStatus::Processing,
                chat_id: ChatId::from("chat-1"),
            }
        );
    }

    #[test]
    fn status_fetch_failure_maps_to_poll_failed() {
        let msg = map_event(EngineEvent::StatusFetchFailed {
            message: "connection refused".to_owned(),
        });
        assert_eq!(msg, Msg::PollFailed);
    }

    #[test]
    fn transcript_fetch_keeps_its_chat_binding() {
        let msg = map_event(EngineEvent::TranscriptFetched {
            chat_id: "chat-1".to_owned(),
            messages: Vec::new(),
        });
        assert_eq!(
            msg,
            Msg::TranscriptRefreshed {
                chat_id: ChatId::from("chat-1"),
                messages: Vec::new(),
            }
        );
    }

    #[test]
    fn wire_messages_round_trip_roles() {
        let original = ChatMessage {
            role: Role::Assistant,
            content: "Hi".to_owned(),
            attachments: Vec::new(),
        };
        assert_eq!(core_message(wire_message(&original)), original);
    }
}
