use crate::{AppState, ClientId, JobStatus, Role, ServerId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub draft: String,
    pub messages: Vec<MessageRowView>,
    pub jobs: Vec<JobRowView>,
    pub degraded: bool,
}

/// One rendered transcript row. Optimistic rows carry their client id so
/// the cancel control can target them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRowView {
    pub role: Role,
    pub content: String,
    pub attachment_names: Vec<String>,
    pub pending: bool,
    pub client_id: Option<ClientId>,
}

/// One tracked job, for the outstanding-work indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRowView {
    pub client_id: ClientId,
    pub server_id: Option<ServerId>,
    pub status: JobStatus,
    /// Only pending jobs expose a cancel control.
    pub cancellable: bool,
}

impl AppViewModel {
    pub(crate) fn project(state: &AppState) -> Self {
        let transcript = state.transcript();
        let mut messages: Vec<MessageRowView> = transcript
            .confirmed()
            .iter()
            .map(|m| MessageRowView {
                role: m.role,
                content: m.content.clone(),
                attachment_names: m.attachments.iter().map(|a| a.name.clone()).collect(),
                pending: false,
                client_id: None,
            })
            .collect();
        messages.extend(transcript.optimistic().iter().map(|m| MessageRowView {
            role: Role::User,
            content: m.content.clone(),
            attachment_names: m.attachments.iter().map(|a| a.name.clone()).collect(),
            pending: true,
            client_id: Some(m.client_id),
        }));

        let jobs = state
            .jobs()
            .iter()
            .map(|job| JobRowView {
                client_id: job.client_id,
                server_id: job.server_id.clone(),
                status: job.status,
                cancellable: job.status == JobStatus::Pending,
            })
            .collect();

        Self {
            draft: state.draft().to_owned(),
            messages,
            jobs,
            degraded: state.degraded(),
        }
    }
}
