//! HTTP surface: webhook intake plus the info and liveness endpoints

pub mod handlers;
pub mod webhook;

use axum::{Router, routing};

use crate::SharedState;

// Re-export handlers
pub use handlers::{ping, root};
pub use webhook::handle_create;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", routing::get(root))
        .route("/ping", routing::get(ping))
        .route("/v1/create", routing::post(handle_create))
        .with_state(state)
}
