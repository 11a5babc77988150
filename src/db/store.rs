use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local};
use redis::AsyncCommands;
use serde::Serialize;
use tracing::{debug, error};
use uuid::Uuid;

use super::{LOGSTASH_KEY, RECENT_KEY};
use crate::error::HookshotError;
use crate::registry::BuildInstance;
use crate::webhook::RepositoryRef;

/// Ordered lists keyed by name. Each call is independent of the others.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Prepend `value` to the list at `key`.
    async fn push_front(&self, key: &str, value: &str) -> Result<(), HookshotError>;

    /// Append `value` to the list at `key`.
    async fn push_back(&self, key: &str, value: &str) -> Result<(), HookshotError>;
}

/// Redis lists (`LPUSH` / `RPUSH`)
#[derive(Clone)]
pub struct RedisEventStore {
    client: redis::Client,
    timeout: Duration,
}

impl RedisEventStore {
    pub fn new(client: redis::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, HookshotError> {
        tokio::time::timeout(self.timeout, self.client.get_multiplexed_async_connection())
            .await
            .map_err(|_| HookshotError::Store("timed out connecting to Redis".to_string()))?
            .map_err(HookshotError::from)
    }

    async fn bounded<F>(&self, op: F) -> Result<(), HookshotError>
    where
        F: std::future::Future<Output = redis::RedisResult<()>>,
    {
        tokio::time::timeout(self.timeout, op)
            .await
            .map_err(|_| HookshotError::Store("timed out writing to Redis".to_string()))?
            .map_err(HookshotError::from)
    }
}

#[async_trait]
impl EventStore for RedisEventStore {
    async fn push_front(&self, key: &str, value: &str) -> Result<(), HookshotError> {
        let mut conn = self.connection().await?;
        self.bounded(conn.lpush(key, value)).await
    }

    async fn push_back(&self, key: &str, value: &str) -> Result<(), HookshotError> {
        let mut conn = self.connection().await?;
        self.bounded(conn.rpush(key, value)).await
    }
}

/// Structured record appended to the log stream
#[derive(Debug, Clone, Serialize)]
pub struct DispatchRecord {
    pub id: Uuid,
    pub source: &'static str,
    pub namespace: String,
    pub repo: String,
    #[serde(rename = "@timestamp", serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<FixedOffset>,
    pub payload: serde_json::Value,
    pub jenkins_url: String,
    pub jenkins_seed_job: String,
    pub jenkins_seed_job_url: String,
}

fn serialize_timestamp<S: serde::Serializer>(
    ts: &DateTime<FixedOffset>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&ts.format("%Y-%m-%dT%H:%M:%S%:z"))
}

impl DispatchRecord {
    /// Record of a push dispatched as `job` on `instance`, stamped with local time.
    pub fn new(
        id: Uuid,
        repo: &RepositoryRef,
        payload: serde_json::Value,
        instance: &BuildInstance,
        job: &str,
    ) -> Self {
        let jenkins_url = instance.base_url();
        Self {
            id,
            source: env!("CARGO_PKG_NAME"),
            namespace: repo.namespace.clone(),
            repo: repo.name.clone(),
            timestamp: Local::now().fixed_offset(),
            payload,
            jenkins_seed_job_url: format!("{}/job/{}", jenkins_url, job),
            jenkins_seed_job: job.to_string(),
            jenkins_url,
        }
    }
}

/// Writes every dispatch to the recent list, its repository's list and the log stream
#[derive(Clone)]
pub struct EventRecorder {
    store: Arc<dyn EventStore>,
}

impl EventRecorder {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// All three writes are attempted even if one fails; the first failure is returned.
    pub async fn record(&self, record: &DispatchRecord) -> Result<(), HookshotError> {
        let id = record.id.to_string();
        let repo_key = format!("{}/{}", record.namespace, record.repo);
        let document = serde_json::to_string(record)
            .map_err(|e| HookshotError::Store(format!("Failed to encode record {}: {}", id, e)))?;

        let results = [
            (RECENT_KEY, self.store.push_front(RECENT_KEY, &id).await),
            (repo_key.as_str(), self.store.push_back(&repo_key, &id).await),
            (LOGSTASH_KEY, self.store.push_back(LOGSTASH_KEY, &document).await),
        ];

        let mut first_error = None;
        for (key, result) in results {
            match result {
                Ok(()) => debug!("Recorded {} in '{}'", id, key),
                Err(e) => {
                    error!("Failed to record {} in '{}': {}", id, key, e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
