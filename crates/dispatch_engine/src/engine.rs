use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use dispatch_logging::dispatch_warn;

use crate::gates::{AttachmentStore, ChatBootstrap, ConversationStore, RateLimiter};
use crate::submit;
use crate::transport::QueueTransport;
use crate::types::{
    CancelRequest, GateRejection, MessagesRequest, QueueStatus, StatusRequest, WireAttachment,
    WireMessage,
};

/// Session identity and model parameters stamped onto every request.
#[derive(Debug, Clone)]
pub struct EngineIdentity {
    pub user_id: String,
    pub is_authenticated: bool,
    pub model: String,
    pub system_prompt: String,
    pub enable_search: bool,
}

/// Collaborators the engine drives. All are seams: tests plug in stubs,
/// the app plugs in HTTP implementations.
#[derive(Clone)]
pub struct EngineConfig {
    pub transport: Arc<dyn QueueTransport>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub chat_bootstrap: Arc<dyn ChatBootstrap>,
    pub attachment_store: Arc<dyn AttachmentStore>,
    pub conversation: Arc<dyn ConversationStore>,
    pub identity: EngineIdentity,
}

pub(crate) enum EngineCommand {
    Submit {
        client_id: u64,
        chat_id: Option<String>,
        content: String,
        attachments: Vec<WireAttachment>,
        history: Vec<WireMessage>,
    },
    FetchStatus {
        queue_ids: Vec<String>,
    },
    Cancel {
        queue_id: String,
    },
    Regenerate {
        chat_id: String,
    },
}

/// What the engine reports back to the state machine. The app maps these
/// onto core messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Enqueued {
        client_id: u64,
        server_id: String,
        status: QueueStatus,
        chat_id: String,
    },
    SubmissionRejected {
        client_id: u64,
        reason: GateRejection,
    },
    EnqueueFailed {
        client_id: u64,
        message: String,
    },
    StatusFetched {
        statuses: Vec<(String, QueueStatus)>,
    },
    StatusFetchFailed {
        message: String,
    },
    CancelFailed {
        queue_id: String,
        message: String,
    },
    TranscriptFetched {
        chat_id: String,
        messages: Vec<WireMessage>,
    },
}

/// Owns the command channel into a dedicated IO thread running a tokio
/// runtime. Each command becomes one spawned task; results come back on
/// the event channel.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let config = Arc::new(config);

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            while let Ok(command) = cmd_rx.recv() {
                let config = config.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(config.as_ref(), command, event_tx).await;
                });
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn submit(
        &self,
        client_id: u64,
        chat_id: Option<String>,
        content: impl Into<String>,
        attachments: Vec<WireAttachment>,
        history: Vec<WireMessage>,
    ) {
        let _ = self.cmd_tx.send(EngineCommand::Submit {
            client_id,
            chat_id,
            content: content.into(),
            attachments,
            history,
        });
    }

    pub fn fetch_status(&self, queue_ids: Vec<String>) {
        let _ = self.cmd_tx.send(EngineCommand::FetchStatus { queue_ids });
    }

    pub fn cancel(&self, queue_id: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Cancel {
            queue_id: queue_id.into(),
        });
    }

    pub fn regenerate(&self, chat_id: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Regenerate {
            chat_id: chat_id.into(),
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn handle_command(
    config: &EngineConfig,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Submit {
            client_id,
            chat_id,
            content,
            attachments,
            history,
        } => {
            let event =
                submit::run_submission(config, client_id, chat_id, content, attachments, history)
                    .await;
            let _ = event_tx.send(event);
        }
        EngineCommand::FetchStatus { queue_ids } => {
            let request = StatusRequest {
                user_id: config.identity.user_id.clone(),
                is_authenticated: config.identity.is_authenticated,
                queue_ids,
            };
            let event = match config.transport.fetch_status(&request).await {
                Ok(statuses) => EngineEvent::StatusFetched { statuses },
                Err(err) => EngineEvent::StatusFetchFailed {
                    message: err.to_string(),
                },
            };
            let _ = event_tx.send(event);
        }
        EngineCommand::Cancel { queue_id } => {
            let request = CancelRequest {
                queue_id: queue_id.clone(),
                user_id: config.identity.user_id.clone(),
                is_authenticated: config.identity.is_authenticated,
            };
            if let Err(err) = config.transport.cancel(&request).await {
                let _ = event_tx.send(EngineEvent::CancelFailed {
                    queue_id,
                    message: "Could not cancel message".to_string(),
                });
                dispatch_warn!("remote cancel failed: {}", err);
            }
        }
        EngineCommand::Regenerate { chat_id } => {
            let request = MessagesRequest {
                user_id: config.identity.user_id.clone(),
                chat_id: chat_id.clone(),
                is_authenticated: config.identity.is_authenticated,
            };
            match config.conversation.fetch_messages(&request).await {
                Ok(messages) => {
                    let _ = event_tx.send(EngineEvent::TranscriptFetched { chat_id, messages });
                }
                // The next completed job will trigger another pull; a
                // missed refresh is not worth a user-facing error.
                Err(err) => dispatch_warn!("regeneration fetch failed: {}", err),
            }
        }
    }
}
