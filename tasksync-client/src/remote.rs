//! Remote task service boundary.

use crate::config::ClientConfig;
use crate::errors::{ClientError, ClientResult};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, Response, Url};
use std::time::Duration;
use tasksync_core::{SyncReport, TaskId, TaskRecord};

/// Network API consumed by the provider. Failures are returned as-is; callers
/// above it never retry.
#[async_trait]
pub trait RemoteService: Send + Sync {
    async fn get_tasks(&self) -> ClientResult<Vec<TaskRecord>>;

    /// The server assigns the canonical id of the returned record.
    async fn create_task(&self, task: &TaskRecord) -> ClientResult<TaskRecord>;

    async fn update_task(&self, id: &TaskId, task: &TaskRecord) -> ClientResult<TaskRecord>;

    async fn delete_task(&self, id: &TaskId) -> ClientResult<()>;

    /// Push a full cache snapshot and receive the per-record outcome.
    async fn sync(&self, snapshot: &[TaskRecord]) -> ClientResult<SyncReport>;
}

/// REST implementation of [`RemoteService`].
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: Url,
    authorization: Option<String>,
}

impl HttpRemote {
    pub fn new(
        base_url: &str,
        authorization: Option<String>,
        timeout: Duration,
    ) -> ClientResult<Self> {
        let parsed = Url::parse(base_url).map_err(|err| {
            ClientError::Config(format!("invalid server_url {}: {}", base_url, err))
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "server_url cannot carry a path: {}",
                base_url
            )));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: parsed,
            authorization,
        })
    }

    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Self::new(
            &config.server_url,
            config.authorization.clone(),
            config.request_timeout(),
        )
    }

    /// Base URL with `segments` appended, each one percent-encoded.
    fn url(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::Config(format!("server_url cannot carry a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.authorization {
            Some(value) => request.header(AUTHORIZATION, value),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> ClientResult<Response> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(status = status.as_u16(), %body, "Remote task service rejected request");
        Err(ClientError::RemoteStatus {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl RemoteService for HttpRemote {
    async fn get_tasks(&self) -> ClientResult<Vec<TaskRecord>> {
        let response = self.send(self.client.get(self.url(&["tasks"])?)).await?;
        Ok(response.json().await?)
    }

    async fn create_task(&self, task: &TaskRecord) -> ClientResult<TaskRecord> {
        let response = self
            .send(self.client.post(self.url(&["tasks"])?).json(task))
            .await?;
        Ok(response.json().await?)
    }

    async fn update_task(&self, id: &TaskId, task: &TaskRecord) -> ClientResult<TaskRecord> {
        let response = self
            .send(self.client.put(self.url(&["tasks", id.as_str()])?).json(task))
            .await?;
        Ok(response.json().await?)
    }

    async fn delete_task(&self, id: &TaskId) -> ClientResult<()> {
        self.send(self.client.delete(self.url(&["tasks", id.as_str()])?))
            .await?;
        Ok(())
    }

    async fn sync(&self, snapshot: &[TaskRecord]) -> ClientResult<SyncReport> {
        let response = self
            .send(self.client.post(self.url(&["tasks", "sync"])?).json(snapshot))
            .await?;
        Ok(response.json().await?)
    }
}
