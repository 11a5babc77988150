//! Webhook related structures

use axum::body::Bytes;
use axum::http::HeaderMap;
use serde::Deserialize;

use crate::error::HookshotError;

pub const EVENT_HEADER: &str = "X-GitHub-Event";
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Sentinel used when a repository has no description
pub const EMPTY_DESCRIPTION: &str = "None";

/// Value of the `X-GitHub-Event` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Ping,
    PullRequest,
    Push,
    Other(String),
}

impl From<&str> for EventKind {
    fn from(tag: &str) -> Self {
        match tag {
            "ping" => EventKind::Ping,
            "pull_request" => EventKind::PullRequest,
            "push" => EventKind::Push,
            other => EventKind::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Ping => f.write_str("ping"),
            EventKind::PullRequest => f.write_str("pull_request"),
            EventKind::Push => f.write_str("push"),
            EventKind::Other(tag) => f.write_str(tag),
        }
    }
}

/// Inbound notification, as received. Nothing has been validated yet.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub kind: Option<EventKind>,
    pub content_type: Option<String>,
    pub signature: Option<String>,
    pub body: Bytes,
}

impl WebhookEvent {
    /// Pull the headers the dispatcher cares about out of a request.
    pub fn from_request(headers: &HeaderMap, body: Bytes) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };

        Self {
            kind: header(EVENT_HEADER).map(|tag| EventKind::from(tag.as_str())),
            content_type: header(axum::http::header::CONTENT_TYPE.as_str()),
            signature: header(SIGNATURE_HEADER),
            body,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PushPayload {
    repository: PushRepository,
    after: String,
}

#[derive(Debug, Deserialize)]
struct PushRepository {
    full_name: String,
    #[serde(default)]
    description: Option<String>,
    url: String,
}

/// Repository coordinates extracted from a push event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub namespace: String,
    pub name: String,
    pub url: String,
    pub description: String,
    pub commit_sha: String,
}

impl RepositoryRef {
    /// Extract the repository a push event refers to.
    ///
    /// `full_name` is split on its first `/`; a blank or null description
    /// becomes [`EMPTY_DESCRIPTION`].
    pub fn from_push(payload: &serde_json::Value) -> Result<Self, HookshotError> {
        let push = PushPayload::deserialize(payload)
            .map_err(|e| HookshotError::InvalidPayload(e.to_string()))?;

        let (namespace, name) = push
            .repository
            .full_name
            .split_once('/')
            .filter(|(ns, name)| !ns.is_empty() && !name.is_empty())
            .ok_or_else(|| {
                HookshotError::InvalidPayload(format!(
                    "repository.full_name '{}' is not of the form owner/name",
                    push.repository.full_name
                ))
            })?;

        let description = push
            .repository
            .description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| EMPTY_DESCRIPTION.to_string());

        Ok(Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            url: push.repository.url,
            description,
            commit_sha: push.after,
        })
    }

    /// Key of the per-repository dispatch list
    pub fn slug(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}
