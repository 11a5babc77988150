//! Jenkins HTTP client: liveness probe, job creation and parameterized builds

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::Url;
use tracing::{debug, warn};

use crate::error::HookshotError;
use crate::registry::BuildInstance;

/// Header every Jenkins master sets on its responses, holding its version
pub const JENKINS_MARKER_HEADER: &str = "X-Jenkins";

/// Operations against a single build engine instance. None of them retry.
#[async_trait]
pub trait BuildEngine: Send + Sync {
    /// True iff the instance answered with a non-empty marker header.
    async fn probe(&self, instance: &BuildInstance) -> bool;

    /// Create job `name` from `template`. True on a 2xx response.
    async fn create_job(&self, instance: &BuildInstance, name: &str, template: &Bytes) -> bool;

    /// Queue a build of `job` with `params`. True on a 2xx response.
    async fn trigger_build(
        &self,
        instance: &BuildInstance,
        job: &str,
        params: &BTreeMap<&'static str, String>,
    ) -> bool;
}

#[derive(Clone)]
pub struct JenkinsClient {
    client: reqwest::Client,
}

impl JenkinsClient {
    pub fn new(timeout: Duration) -> Result<Self, HookshotError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HookshotError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    fn url(instance: &BuildInstance, segments: &[&str]) -> Option<Url> {
        let mut url = Url::parse(&instance.base_url()).ok()?;
        url.path_segments_mut().ok()?.pop_if_empty().extend(segments);
        Some(url)
    }
}

#[async_trait]
impl BuildEngine for JenkinsClient {
    async fn probe(&self, instance: &BuildInstance) -> bool {
        let Ok(url) = Url::parse(&instance.base_url()) else {
            return false;
        };

        match self.client.get(url).send().await {
            Ok(response) => response
                .headers()
                .get(JENKINS_MARKER_HEADER)
                .map(|v| !v.is_empty())
                .unwrap_or(false),
            Err(e) => {
                warn!("Health check of {} failed: {}", instance, e);
                false
            }
        }
    }

    async fn create_job(&self, instance: &BuildInstance, name: &str, template: &Bytes) -> bool {
        let Some(mut url) = Self::url(instance, &["createItem"]) else {
            return false;
        };
        url.query_pairs_mut().append_pair("name", name);

        debug!("Creating job {} on {}", name, instance);
        match self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/xml")
            .body(template.clone())
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!(
                    "Jenkins {} refused job {}: {}",
                    instance,
                    name,
                    response.status()
                );
                false
            }
            Err(e) => {
                warn!("Job creation request to {} failed: {}", instance, e);
                false
            }
        }
    }

    async fn trigger_build(
        &self,
        instance: &BuildInstance,
        job: &str,
        params: &BTreeMap<&'static str, String>,
    ) -> bool {
        let Some(mut url) = Self::url(instance, &["job", job, "buildWithParameters"]) else {
            return false;
        };
        url.query_pairs_mut().extend_pairs(params.iter());

        debug!("Triggering {} on {}", job, instance);
        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!(
                    "Jenkins {} refused build of {}: {}",
                    instance,
                    job,
                    response.status()
                );
                false
            }
            Err(e) => {
                warn!("Build trigger request to {} failed: {}", instance, e);
                false
            }
        }
    }
}
