use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dispatch_logging::{dispatch_debug, dispatch_warn};

use crate::{AttachmentRef, ClientId, JobStatus, QueueJob, ServerId};

/// Mapping from local submission identity to server queue identity and
/// status; the engine's sole source of truth for outstanding work.
///
/// Keyed by `ClientId`, so iteration order is submission order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CorrelationTable {
    jobs: BTreeMap<ClientId, QueueJob>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `Pending` entry with no server id yet.
    pub(crate) fn create(
        &mut self,
        client_id: ClientId,
        content: String,
        attachments: Vec<AttachmentRef>,
        created_at: DateTime<Utc>,
    ) -> QueueJob {
        debug_assert!(!self.jobs.contains_key(&client_id));
        let job = QueueJob {
            client_id,
            server_id: None,
            status: JobStatus::Pending,
            content,
            created_at,
            attachments,
        };
        self.jobs.insert(client_id, job.clone());
        job
    }

    /// Records the server queue id for a job. Write-once: a second
    /// assignment is ignored. A missing entry is a logged no-op, which
    /// absorbs the race where the job was cancelled while the enqueue
    /// request was in flight.
    pub(crate) fn attach_server_id(
        &mut self,
        client_id: ClientId,
        server_id: ServerId,
        status: JobStatus,
    ) {
        let Some(job) = self.jobs.get_mut(&client_id) else {
            dispatch_warn!(
                "attach_server_id: job {} already gone, dropping server id {}",
                client_id,
                server_id
            );
            return;
        };
        if let Some(existing) = &job.server_id {
            dispatch_warn!(
                "attach_server_id: job {} already has server id {}, ignoring {}",
                client_id,
                existing,
                server_id
            );
            return;
        }
        job.server_id = Some(server_id);
        job.status = status;
    }

    /// Upgrades a job to `Processing`. Only valid for jobs with a server
    /// id, which holds by construction: the server id is the lookup key.
    pub(crate) fn mark_processing(&mut self, server_id: &ServerId) {
        if let Some(job) = self
            .jobs
            .values_mut()
            .find(|job| job.server_id.as_ref() == Some(server_id))
        {
            job.status = JobStatus::Processing;
        }
    }

    /// Removes and returns the entry for `client_id`. Idempotent.
    pub(crate) fn remove_by_client(&mut self, client_id: ClientId) -> Option<QueueJob> {
        let removed = self.jobs.remove(&client_id);
        if removed.is_none() {
            dispatch_debug!("remove_by_client: {} not tracked", client_id);
        }
        removed
    }

    /// Removes and returns the entry holding `server_id`. Idempotent.
    pub(crate) fn remove_by_server(&mut self, server_id: &ServerId) -> Option<QueueJob> {
        let client_id = self
            .jobs
            .values()
            .find(|job| job.server_id.as_ref() == Some(server_id))
            .map(|job| job.client_id)?;
        self.jobs.remove(&client_id)
    }

    pub fn get(&self, client_id: ClientId) -> Option<&QueueJob> {
        self.jobs.get(&client_id)
    }

    pub fn find_by_server(&self, server_id: &ServerId) -> Option<&QueueJob> {
        self.jobs
            .values()
            .find(|job| job.server_id.as_ref() == Some(server_id))
    }

    /// All jobs with an assigned server id, in submission order. This is
    /// the poll input; jobs still waiting on their enqueue response are
    /// excluded.
    pub fn outstanding(&self) -> Vec<&QueueJob> {
        self.jobs
            .values()
            .filter(|job| job.server_id.is_some())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueJob> {
        self.jobs.values()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.jobs.clear();
    }
}
