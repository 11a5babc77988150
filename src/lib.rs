pub mod api;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod jenkins;
pub mod job;
pub mod locator;
pub mod logging;
pub mod registry;
pub mod utils;
pub mod webhook;

use axum::body::Bytes;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::db::{EventRecorder, EventStore};
use crate::error::HookshotError;
use crate::jenkins::{BuildEngine, JenkinsClient};
use crate::locator::{DEFAULT_MAX_ATTEMPTS, InstanceLocator};
use crate::registry::{MarathonRegistry, Registry};

/// What to do when a step after job creation fails
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure and carry on
    #[default]
    BestEffort,
    /// Fail the request with a 500
    Strict,
}

impl std::str::FromStr for FailurePolicy {
    type Err = HookshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "best_effort" | "best-effort" => Ok(FailurePolicy::BestEffort),
            "strict" => Ok(FailurePolicy::Strict),
            other => Err(HookshotError::ConfigError(format!(
                "Unknown failure policy '{}', expected best_effort or strict",
                other
            ))),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HookshotConfig {
    pub listening_port: u16,
    /// Marathon host or load balancer, `host:port`
    pub marathon_host: String,
    /// Marathon application ID of the Jenkins masters
    pub marathon_app_id: String,
    pub redis_host: String,
    pub github_hook_secret: Option<String>,
    // Carried for deployments that set them; no Jenkins call authenticates yet.
    pub jenkins_username: Option<String>,
    pub jenkins_password: Option<String>,
    pub job_template_path: PathBuf,
    pub request_timeout_secs: u64,
    pub max_selection_attempts: usize,
    pub trigger_policy: FailurePolicy,
    pub record_policy: FailurePolicy,
    pub log_directory: Option<PathBuf>,
}

impl Default for HookshotConfig {
    fn default() -> Self {
        Self {
            listening_port: 8000,
            marathon_host: "localhost:8080".to_string(),
            marathon_app_id: "jenkins".to_string(),
            redis_host: "localhost".to_string(),
            github_hook_secret: None,
            jenkins_username: None,
            jenkins_password: None,
            job_template_path: PathBuf::from("resources/config.xml"),
            request_timeout_secs: 10,
            max_selection_attempts: DEFAULT_MAX_ATTEMPTS,
            trigger_policy: FailurePolicy::BestEffort,
            record_policy: FailurePolicy::BestEffort,
            log_directory: None,
        }
    }
}

impl HookshotConfig {
    /// The webhook secret, if a non-empty one is configured.
    pub fn secret(&self) -> Option<&str> {
        self.github_hook_secret
            .as_deref()
            .filter(|s| !s.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), HookshotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(key: &str, raw: String) -> Result<T, HookshotError> {
            raw.parse()
                .map_err(|_| HookshotError::ConfigError(format!("Invalid value for {}: '{}'", key, raw)))
        }

        if let Some(v) = lookup("LISTENING_PORT") {
            self.listening_port = parsed("LISTENING_PORT", v)?;
        }
        if let Some(v) = lookup("MARATHON_HOST") {
            self.marathon_host = v;
        }
        if let Some(v) = lookup("MARATHON_APP_ID") {
            self.marathon_app_id = v;
        }
        if let Some(v) = lookup("REDIS_HOST") {
            self.redis_host = v;
        }
        if let Some(v) = lookup("GITHUB_HOOK_SECRET") {
            self.github_hook_secret = Some(v);
        }
        if let Some(v) = lookup("JENKINS_USERNAME") {
            self.jenkins_username = Some(v);
        }
        if let Some(v) = lookup("JENKINS_PASSWORD") {
            self.jenkins_password = Some(v);
        }
        if let Some(v) = lookup("JOB_TEMPLATE_PATH") {
            self.job_template_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parsed("REQUEST_TIMEOUT_SECS", v)?;
        }
        if let Some(v) = lookup("MAX_SELECTION_ATTEMPTS") {
            self.max_selection_attempts = parsed("MAX_SELECTION_ATTEMPTS", v)?;
        }
        if let Some(v) = lookup("TRIGGER_POLICY") {
            self.trigger_policy = v.parse()?;
        }
        if let Some(v) = lookup("RECORD_POLICY") {
            self.record_policy = v.parse()?;
        }
        if let Some(v) = lookup("LOG_DIRECTORY") {
            self.log_directory = Some(PathBuf::from(v));
        }
        Ok(())
    }
}

/// Load configuration from `path` (a missing file means defaults), then
/// apply environment overrides.
pub fn load_config(path: impl AsRef<Path>) -> Result<HookshotConfig, HookshotError> {
    let path = path.as_ref();
    let mut config = if path.exists() {
        let config_str = std::fs::read_to_string(path).map_err(|e| {
            HookshotError::ConfigError(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        toml::from_str(&config_str)?
    } else {
        HookshotConfig::default()
    };

    config.apply_overrides(|key| std::env::var(key).ok())?;
    Ok(config)
}

pub struct AppState {
    pub config: HookshotConfig,
    /// Job definition POSTed for every new job, read once at startup
    pub job_template: Bytes,
    pub locator: InstanceLocator,
    pub engine: Arc<dyn BuildEngine>,
    pub recorder: EventRecorder,
}

impl AppState {
    pub fn new(
        config: HookshotConfig,
        job_template: Bytes,
        registry: Arc<dyn Registry>,
        engine: Arc<dyn BuildEngine>,
        store: Arc<dyn EventStore>,
    ) -> Self {
        let locator = InstanceLocator::new(registry, engine.clone())
            .with_max_attempts(config.max_selection_attempts);
        Self {
            config,
            job_template,
            locator,
            engine,
            recorder: EventRecorder::new(store),
        }
    }

    /// Wire up the Marathon, Jenkins and Redis clients described by `config`.
    pub fn from_config(config: HookshotConfig) -> Result<Self, HookshotError> {
        let template = std::fs::read(&config.job_template_path).map_err(|e| {
            HookshotError::ConfigError(format!(
                "Failed to read job template '{}': {}",
                config.job_template_path.display(),
                e
            ))
        })?;
        info!(
            "Loaded job template from {:?} ({} bytes)",
            config.job_template_path,
            template.len()
        );

        let timeout = config.request_timeout();
        let registry = Arc::new(MarathonRegistry::new(&config.marathon_host, timeout)?);
        let engine = Arc::new(JenkinsClient::new(timeout)?);
        let store = Arc::new(db::init_store(&config.redis_host, timeout)?);

        Ok(Self::new(config, Bytes::from(template), registry, engine, store))
    }
}

pub type SharedState = Arc<AppState>;
