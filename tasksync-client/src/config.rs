use crate::errors::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:tasksync.db";
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080/task-manager";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub database_url: String,
    pub server_url: String,
    /// Sent verbatim as the `Authorization` header when present.
    pub authorization: Option<String>,
    pub request_timeout_secs: u64,
    pub max_connections: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            server_url: DEFAULT_SERVER_URL.to_string(),
            authorization: None,
            request_timeout_secs: 30,
            max_connections: 5,
        }
    }
}

impl ClientConfig {
    pub fn new(database_url: impl Into<String>, server_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            server_url: server_url.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `TASKSYNC_*` environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> ClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("TASKSYNC_DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(url) = lookup("TASKSYNC_SERVER_URL") {
            config.server_url = url;
        }
        if let Some(value) = lookup("TASKSYNC_AUTHORIZATION") {
            config.authorization = Some(value);
        }
        if let Some(raw) = lookup("TASKSYNC_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = raw.parse().map_err(|_| {
                ClientError::Config(format!("TASKSYNC_REQUEST_TIMEOUT_SECS is not a number: {}", raw))
            })?;
        }
        if let Some(raw) = lookup("TASKSYNC_MAX_CONNECTIONS") {
            config.max_connections = raw.parse().map_err(|_| {
                ClientError::Config(format!("TASKSYNC_MAX_CONNECTIONS is not a number: {}", raw))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.database_url.trim().is_empty() {
            return Err(ClientError::Config("database_url is empty".into()));
        }
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "server_url must be an http(s) URL: {}",
                self.server_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ClientError::Config("request_timeout_secs must be positive".into()));
        }
        if self.max_connections == 0 {
            return Err(ClientError::Config("max_connections must be positive".into()));
        }
        Ok(())
    }
}
