//! Service registry lookups for the Jenkins pool

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::HookshotError;

/// Address of one running Jenkins master
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInstance {
    pub host: String,
    pub port: u16,
}

impl BuildInstance {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for BuildInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url())
    }
}

/// Resolves a pool identifier to the instances currently running in it.
#[async_trait]
pub trait Registry: Send + Sync {
    async fn tasks(&self, pool: &str) -> Result<Vec<BuildInstance>, HookshotError>;
}

#[derive(Debug, Deserialize)]
struct MarathonTasks {
    tasks: Vec<MarathonTask>,
}

#[derive(Debug, Deserialize)]
struct MarathonTask {
    host: String,
    #[serde(default)]
    ports: Vec<u16>,
}

/// Marathon REST API client
#[derive(Clone)]
pub struct MarathonRegistry {
    base_url: String,
    client: reqwest::Client,
}

impl MarathonRegistry {
    /// `marathon_host` is `host:port` of Marathon or its load balancer.
    pub fn new(marathon_host: &str, timeout: Duration) -> Result<Self, HookshotError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HookshotError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: format!("http://{}", marathon_host.trim_end_matches('/')),
            client,
        })
    }

    fn tasks_url(&self, pool: &str) -> String {
        format!("{}/v2/apps/{}/tasks", self.base_url, pool.trim_matches('/'))
    }
}

#[async_trait]
impl Registry for MarathonRegistry {
    async fn tasks(&self, pool: &str) -> Result<Vec<BuildInstance>, HookshotError> {
        let registry_error = |message: String| HookshotError::Registry {
            pool: pool.to_string(),
            message,
        };

        let url = self.tasks_url(pool);
        debug!("Querying Marathon: {}", url);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| registry_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(registry_error(format!(
                "Marathon returned {}",
                response.status()
            )));
        }

        let body: MarathonTasks = response
            .json()
            .await
            .map_err(|e| registry_error(e.to_string()))?;

        Ok(body
            .tasks
            .into_iter()
            .filter_map(|task| {
                let port = *task.ports.first()?;
                Some(BuildInstance::new(task.host, port))
            })
            .collect())
    }
}
