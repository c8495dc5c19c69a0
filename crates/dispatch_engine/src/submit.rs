use dispatch_logging::{dispatch_info, dispatch_warn};

use crate::engine::{EngineConfig, EngineEvent};
use crate::types::{
    EnqueueRequest, GateRejection, TransportError, WireAttachment, WireMessage,
    ENQUEUE_FALLBACK_ERROR, MAX_PROMPT_CHARS,
};

/// The submission pipeline: three gates (rate limit, chat bootstrap,
/// length ceiling), the upload gate when attachments are present, then the
/// one-shot enqueue. Any gate rejection short-circuits without contacting
/// the queue endpoint.
pub(crate) async fn run_submission(
    config: &EngineConfig,
    client_id: u64,
    chat_id: Option<String>,
    content: String,
    attachments: Vec<WireAttachment>,
    history: Vec<WireMessage>,
) -> EngineEvent {
    let identity = &config.identity;

    if !config.rate_limiter.check(&identity.user_id).await {
        return EngineEvent::SubmissionRejected {
            client_id,
            reason: GateRejection::RateLimited,
        };
    }

    let chat_id = match chat_id {
        Some(id) => id,
        None => match config
            .chat_bootstrap
            .ensure_chat(&identity.user_id, &content)
            .await
        {
            Some(id) => id,
            None => {
                return EngineEvent::SubmissionRejected {
                    client_id,
                    reason: GateRejection::ChatUnavailable,
                }
            }
        },
    };

    if content.chars().count() > MAX_PROMPT_CHARS {
        return EngineEvent::SubmissionRejected {
            client_id,
            reason: GateRejection::TooLong,
        };
    }

    let uploaded = if attachments.is_empty() {
        Vec::new()
    } else {
        match config
            .attachment_store
            .upload(&identity.user_id, &chat_id, &attachments)
            .await
        {
            Some(uploaded) => uploaded,
            None => {
                return EngineEvent::SubmissionRejected {
                    client_id,
                    reason: GateRejection::UploadFailed,
                }
            }
        }
    };

    let request = EnqueueRequest {
        user_id: identity.user_id.clone(),
        chat_id: chat_id.clone(),
        model: identity.model.clone(),
        is_authenticated: identity.is_authenticated,
        system_prompt: identity.system_prompt.clone(),
        enable_search: identity.enable_search,
        messages: history,
        attachments: uploaded.clone(),
    };

    match config.transport.enqueue(&request).await {
        Ok(handle) => {
            dispatch_info!(
                "job {} enqueued as {} ({:?})",
                client_id,
                handle.id,
                handle.status
            );
            EngineEvent::Enqueued {
                client_id,
                server_id: handle.id,
                status: handle.status,
                chat_id,
            }
        }
        Err(err) => {
            if !uploaded.is_empty() {
                config.attachment_store.cleanup(&uploaded).await;
            }
            let message = match err {
                TransportError::Rejected(message) => message,
                other => {
                    dispatch_warn!("enqueue transport error for {}: {}", client_id, other);
                    ENQUEUE_FALLBACK_ERROR.to_string()
                }
            };
            EngineEvent::EnqueueFailed { client_id, message }
        }
    }
}
