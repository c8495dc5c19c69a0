use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::{
    CancelRequest, CancelResponse, EnqueueRequest, EnqueueResponse, QueueHandle, QueueStatus,
    StatusRequest, StatusResponse, TransportError, ENQUEUE_FALLBACK_ERROR,
};

const ENQUEUE_PATH: &str = "/api/queue";
const STATUS_PATH: &str = "/api/queue/status";
const CANCEL_PATH: &str = "/api/queue/cancel";

#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// The one-shot request/response seam to the remote queue.
#[async_trait::async_trait]
pub trait QueueTransport: Send + Sync {
    /// Hands a prompt to the queue; returns the server id and initial
    /// status.
    async fn enqueue(&self, request: &EnqueueRequest) -> Result<QueueHandle, TransportError>;

    /// One batched status fetch for all outstanding server ids.
    async fn fetch_status(
        &self,
        request: &StatusRequest,
    ) -> Result<Vec<(String, QueueStatus)>, TransportError>;

    /// Best-effort cancel of a still-pending job.
    async fn cancel(&self, request: &CancelRequest) -> Result<(), TransportError>;
}

#[derive(Debug, Clone)]
pub struct HttpQueueTransport {
    client: reqwest::Client,
    settings: TransportSettings,
}

impl HttpQueueTransport {
    pub fn new(settings: TransportSettings) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| TransportError::Network(err.to_string()))?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    pub(crate) async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, TransportError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::HttpStatus(status.as_u16()));
        }

        response
            .json::<R>()
            .await
            .map_err(|err| TransportError::Malformed(err.to_string()))
    }
}

#[async_trait::async_trait]
impl QueueTransport for HttpQueueTransport {
    async fn enqueue(&self, request: &EnqueueRequest) -> Result<QueueHandle, TransportError> {
        let response: EnqueueResponse = self.post(ENQUEUE_PATH, request).await?;
        if !response.success {
            return Err(TransportError::Rejected(
                response
                    .error
                    .unwrap_or_else(|| ENQUEUE_FALLBACK_ERROR.to_string()),
            ));
        }
        response
            .queue
            .ok_or_else(|| TransportError::Malformed("missing queue handle".to_string()))
    }

    async fn fetch_status(
        &self,
        request: &StatusRequest,
    ) -> Result<Vec<(String, QueueStatus)>, TransportError> {
        let response: StatusResponse = self.post(STATUS_PATH, request).await?;
        if !response.success {
            return Err(TransportError::Rejected(
                response
                    .error
                    .unwrap_or_else(|| "status check failed".to_string()),
            ));
        }
        Ok(response
            .queue
            .into_iter()
            .map(|handle| (handle.id, handle.status))
            .collect())
    }

    async fn cancel(&self, request: &CancelRequest) -> Result<(), TransportError> {
        let response: CancelResponse = self.post(CANCEL_PATH, request).await?;
        if !response.success {
            return Err(TransportError::Rejected(
                response
                    .error
                    .unwrap_or_else(|| "cancel failed".to_string()),
            ));
        }
        Ok(())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout;
    }
    TransportError::Network(err.to_string())
}
