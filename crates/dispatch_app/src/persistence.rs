use std::path::Path;

use dispatch_core::{AttachmentRef, ChatMessage, Role};
use dispatch_engine::SnapshotStore;
use dispatch_logging::{dispatch_error, dispatch_info, dispatch_warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedAttachment {
    name: String,
    content_type: String,
    url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedMessage {
    role: String,
    content: String,
    attachments: Vec<PersistedAttachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedTranscript {
    messages: Vec<PersistedMessage>,
}

fn store(cache_dir: &Path) -> SnapshotStore {
    SnapshotStore::new(cache_dir.to_path_buf())
}

/// Loads the cached confirmed transcript, if any. Parse errors are logged
/// and treated as an empty cache.
pub(crate) fn load_transcript(cache_dir: &Path) -> Vec<ChatMessage> {
    let store = store(cache_dir);
    let content = match store.load_transcript() {
        Ok(Some(text)) => text,
        Ok(None) => return Vec::new(),
        Err(err) => {
            dispatch_warn!("Failed to read transcript snapshot in {:?}: {}", cache_dir, err);
            return Vec::new();
        }
    };

    let cached: PersistedTranscript = match ron::from_str(&content) {
        Ok(cached) => cached,
        Err(err) => {
            dispatch_warn!("Failed to parse transcript snapshot in {:?}: {}", cache_dir, err);
            return Vec::new();
        }
    };

    dispatch_info!("Loaded cached transcript from {:?}", cache_dir);
    cached
        .messages
        .into_iter()
        .map(|message| ChatMessage {
            role: parse_role(&message.role),
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
        })
        .collect()
}

pub(crate) fn save_transcript(cache_dir: &Path, messages: &[ChatMessage]) {
    let cached = PersistedTranscript {
        messages: messages
            .iter()
            .map(|message| PersistedMessage {
                role: role_name(message.role).to_owned(),
                content: message.content.clone(),
                attachments: message
                    .attachments
                    .iter()
                    .map(|a| PersistedAttachment {
                        name: a.name.clone(),
                        content_type: a.content_type.clone(),
                        url: a.url.clone(),
                    })
                    .collect(),
            })
            .collect(),
    };

    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&cached, pretty) {
        Ok(text) => text,
        Err(err) => {
            dispatch_error!("Failed to serialize transcript snapshot: {}", err);
            return;
        }
    };

    if let Err(err) = store(cache_dir).save_transcript(&content) {
        dispatch_error!("Failed to write transcript snapshot in {:?}: {}", cache_dir, err);
    }
}

/// Restores an unsent draft left over from a previous run.
pub(crate) fn load_draft(cache_dir: &Path) -> Option<String> {
    match store(cache_dir).load_draft() {
        Ok(Some(text)) if !text.trim().is_empty() => Some(text),
        Ok(_) => None,
        Err(err) => {
            dispatch_warn!("Failed to read draft snapshot in {:?}: {}", cache_dir, err);
            None
        }
    }
}

pub(crate) fn save_draft(cache_dir: &Path, draft: &str) {
    if draft.trim().is_empty() {
        clear_draft(cache_dir);
        return;
    }
    if let Err(err) = store(cache_dir).save_draft(draft) {
        dispatch_error!("Failed to write draft snapshot in {:?}: {}", cache_dir, err);
    }
}

/// Removes the persisted draft once the prompt has been submitted.
pub(crate) fn clear_draft(cache_dir: &Path) {
    if let Err(err) = store(cache_dir).clear_draft() {
        dispatch_warn!("Failed to clear draft snapshot in {:?}: {}", cache_dir, err);
    }
}

fn parse_role(role: &str) -> Role {
    if role.eq_ignore_ascii_case("assistant") {
        Role::Assistant
    } else {
        Role::User
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(role: Role, content: &str) -> ChatMessage {
        ChatMessage {
            role,
            content: content.to_owned(),
            attachments: Vec::new(),
        }
    }

    #[test]
    fn transcript_round_trips_through_the_cache() {
        let dir = tempfile::tempdir().expect("tempdir");
        let messages = vec![
            ChatMessage {
                role: Role::User,
                content: "Hello".to_owned(),
                attachments: vec![AttachmentRef {
                    name: "a.png".to_owned(),
                    content_type: "image/png".to_owned(),
                    url: "https://files.example/a.png".to_owned(),
                }],
            },
            message(Role::Assistant, "Hi there"),
        ];

        save_transcript(dir.path(), &messages);
        let restored = load_transcript(dir.path());
        assert_eq!(restored, messages);
    }

    #[test]
    fn missing_cache_loads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_transcript(dir.path()).is_empty());
    }

    #[test]
    fn corrupt_cache_loads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = store(dir.path()).transcript_path();
        std::fs::write(path, "not ron at all").unwrap();
        assert!(load_transcript(dir.path()).is_empty());
    }

    #[test]
    fn draft_is_saved_and_cleared() {
        let dir = tempfile::tempdir().expect("tempdir");
        save_draft(dir.path(), "half a thought");
        assert_eq!(load_draft(dir.path()).as_deref(), Some("half a thought"));

        clear_draft(dir.path());
        assert_eq!(load_draft(dir.path()), None);
        // Clearing twice is fine.
        clear_draft(dir.path());
    }
}
