//! Dispatch of a single webhook delivery: verify, parse, locate, create,
//! trigger, record.

use std::fmt;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::AppState;
use crate::FailurePolicy;
use crate::db::DispatchRecord;
use crate::error::HookshotError;
use crate::job::JobSpec;
use crate::registry::BuildInstance;
use crate::utils::verify_github_signature;
use crate::webhook::{EventKind, JSON_CONTENT_TYPE, RepositoryRef, WebhookEvent};

/// Successful end states of a dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Pong,
    Created {
        uniq_id: Uuid,
        job_name: String,
        instance: BuildInstance,
    },
}

/// Response body sent back to the webhook sender
impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchOutcome::Pong => f.write_str("pong"),
            DispatchOutcome::Created {
                job_name, instance, ..
            } => write!(
                f,
                "Success: created Jenkins job {} on Jenkins host {}",
                job_name, instance
            ),
        }
    }
}

/// Run one delivery through the pipeline. Any error ends the dispatch; the
/// sender is expected to redeliver.
pub async fn dispatch(state: &AppState, event: WebhookEvent) -> Result<DispatchOutcome, HookshotError> {
    let kind = validate(state, &event)?;

    let payload: serde_json::Value = serde_json::from_slice(&event.body)
        .map_err(|e| HookshotError::InvalidJson(e.to_string()))?;

    match kind {
        EventKind::Ping => Ok(DispatchOutcome::Pong),
        EventKind::Push => dispatch_push(state, payload).await,
        EventKind::PullRequest => Err(HookshotError::NotImplemented(
            "pull_request".to_string(),
        )),
        other => Err(HookshotError::NotImplemented(other.to_string())),
    }
}

fn validate(state: &AppState, event: &WebhookEvent) -> Result<EventKind, HookshotError> {
    let kind = event
        .kind
        .clone()
        .ok_or(HookshotError::MissingEventHeader)?;

    let content_type = event.content_type.as_deref().unwrap_or_default();
    if content_type != JSON_CONTENT_TYPE {
        return Err(HookshotError::InvalidContentType(content_type.to_string()));
    }

    if !verify_github_signature(
        state.config.secret(),
        &event.body,
        event.signature.as_deref(),
    ) {
        return Err(HookshotError::SignatureMismatch);
    }

    Ok(kind)
}

async fn dispatch_push(
    state: &AppState,
    payload: serde_json::Value,
) -> Result<DispatchOutcome, HookshotError> {
    let repo = RepositoryRef::from_push(&payload)?;
    let instance = state.locator.locate(&state.config.marathon_app_id).await?;

    let uniq_id = Uuid::new_v4();
    let job = JobSpec::for_push(&repo, uniq_id);

    if !state
        .engine
        .create_job(&instance, &job.name, &state.job_template)
        .await
    {
        return Err(HookshotError::JobCreationFailed {
            job: job.name,
            instance: instance.to_string(),
        });
    }
    info!(
        "Created Jenkins job {} on {} for {} at {}",
        job.name,
        instance,
        repo.slug(),
        repo.commit_sha
    );

    if !state
        .engine
        .trigger_build(&instance, &job.name, &job.params)
        .await
    {
        let err = HookshotError::TriggerFailed {
            job: job.name.clone(),
            instance: instance.to_string(),
        };
        match state.config.trigger_policy {
            FailurePolicy::Strict => return Err(err),
            FailurePolicy::BestEffort => warn!("{} (continuing)", err),
        }
    }

    let record = DispatchRecord::new(uniq_id, &repo, payload, &instance, &job.name);
    if let Err(err) = state.recorder.record(&record).await {
        match state.config.record_policy {
            FailurePolicy::Strict => return Err(err),
            FailurePolicy::BestEffort => {
                error!("Dispatch {} not fully recorded: {} (continuing)", uniq_id, err)
            }
        }
    }

    Ok(DispatchOutcome::Created {
        uniq_id,
        job_name: job.name,
        instance,
    })
}
