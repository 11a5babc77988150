//! Webhook handler for GitHub deliveries

use axum::{
    body::Bytes,
    extract::State as AxumState,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use tracing::{debug, info};

use super::handlers::plain;
use crate::SharedState;
use crate::dispatch::dispatch;
use crate::webhook::WebhookEvent;

/// POST /v1/create - dispatch a GitHub webhook delivery to Jenkins
pub async fn handle_create(
    AxumState(state): AxumState<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let event = WebhookEvent::from_request(&headers, body);
    debug!(
        "Received {:?} event ({} bytes)",
        event.kind,
        event.body.len()
    );

    match dispatch(&state, event).await {
        Ok(outcome) => {
            info!("{}", outcome);
            plain(outcome.to_string()).into_response()
        }
        Err(e) => e.into_response(),
    }
}
