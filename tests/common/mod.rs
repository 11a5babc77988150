#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, Bytes, to_bytes};
use axum::http::{Request, StatusCode, header};
use hookshot::db::EventStore;
use hookshot::error::HookshotError;
use hookshot::jenkins::BuildEngine;
use hookshot::registry::{BuildInstance, Registry};
use hookshot::{AppState, HookshotConfig, api};
use tower::ServiceExt;

pub const TEMPLATE: &[u8] = b"<project><description>seed</description></project>";

pub struct FakeRegistry {
    pub tasks: Vec<BuildInstance>,
    pub queries: AtomicUsize,
}

impl FakeRegistry {
    pub fn with_tasks(tasks: Vec<BuildInstance>) -> Arc<Self> {
        Arc::new(Self {
            tasks,
            queries: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Registry for FakeRegistry {
    async fn tasks(&self, _pool: &str) -> Result<Vec<BuildInstance>, HookshotError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.tasks.clone())
    }
}

pub struct FakeJenkins {
    pub healthy: bool,
    pub accept_jobs: bool,
    pub accept_builds: bool,
    pub probes: AtomicUsize,
    pub created: Mutex<Vec<(String, Vec<u8>)>>,
    pub triggered: Mutex<Vec<(String, BTreeMap<String, String>)>>,
}

impl Default for FakeJenkins {
    fn default() -> Self {
        Self {
            healthy: true,
            accept_jobs: true,
            accept_builds: true,
            probes: AtomicUsize::new(0),
            created: Mutex::new(Vec::new()),
            triggered: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl BuildEngine for FakeJenkins {
    async fn probe(&self, _instance: &BuildInstance) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.healthy
    }

    async fn create_job(&self, _instance: &BuildInstance, name: &str, template: &Bytes) -> bool {
        if self.accept_jobs {
            self.created
                .lock()
                .unwrap()
                .push((name.to_string(), template.to_vec()));
        }
        self.accept_jobs
    }

    async fn trigger_build(
        &self,
        _instance: &BuildInstance,
        job: &str,
        params: &BTreeMap<&'static str, String>,
    ) -> bool {
        let params = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        self.triggered.lock().unwrap().push((job.to_string(), params));
        self.accept_builds
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Front(String, String),
    Back(String, String),
}

#[derive(Default)]
pub struct MemoryStore {
    pub writes: Mutex<Vec<Write>>,
    pub unavailable: bool,
}

impl MemoryStore {
    pub fn writes(&self) -> Vec<Write> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn push_front(&self, key: &str, value: &str) -> Result<(), HookshotError> {
        if self.unavailable {
            return Err(HookshotError::Store("connection refused".into()));
        }
        self.writes
            .lock()
            .unwrap()
            .push(Write::Front(key.to_string(), value.to_string()));
        Ok(())
    }

    async fn push_back(&self, key: &str, value: &str) -> Result<(), HookshotError> {
        if self.unavailable {
            return Err(HookshotError::Store("connection refused".into()));
        }
        self.writes
            .lock()
            .unwrap()
            .push(Write::Back(key.to_string(), value.to_string()));
        Ok(())
    }
}

pub struct Harness {
    pub app: Router,
    pub registry: Arc<FakeRegistry>,
    pub jenkins: Arc<FakeJenkins>,
    pub store: Arc<MemoryStore>,
}

impl Harness {
    pub fn new(config: HookshotConfig, jenkins: FakeJenkins, store: MemoryStore) -> Self {
        Self::with_pool(
            config,
            vec![BuildInstance::new("10.0.0.1", 31000)],
            jenkins,
            store,
        )
    }

    pub fn with_pool(
        config: HookshotConfig,
        tasks: Vec<BuildInstance>,
        jenkins: FakeJenkins,
        store: MemoryStore,
    ) -> Self {
        let registry = FakeRegistry::with_tasks(tasks);
        let jenkins = Arc::new(jenkins);
        let store = Arc::new(store);
        let state = AppState::new(
            config,
            Bytes::from_static(TEMPLATE),
            registry.clone(),
            jenkins.clone(),
            store.clone(),
        );

        Self {
            app: api::router(Arc::new(state)),
            registry,
            jenkins,
            store,
        }
    }

    pub fn healthy() -> Self {
        Self::new(
            HookshotConfig::default(),
            FakeJenkins::default(),
            MemoryStore::default(),
        )
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, String, String) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap(), content_type)
    }
}

pub fn webhook(event: Option<&str>, content_type: &str, body: &str) -> Request<Body> {
    signed_webhook(event, content_type, body, None)
}

pub fn signed_webhook(
    event: Option<&str>,
    content_type: &str,
    body: &str,
    signature: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/v1/create")
        .header(header::CONTENT_TYPE, content_type);
    if let Some(event) = event {
        builder = builder.header("X-GitHub-Event", event);
    }
    if let Some(signature) = signature {
        builder = builder.header("X-Hub-Signature", signature);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub const PUSH_PAYLOAD: &str = r#"{"repository":{"full_name":"acme/widgets","description":"","url":"https://x/acme/widgets"},"after":"deadbeef"}"#;
