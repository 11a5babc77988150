use axum::http::header;
use axum::response::IntoResponse;

/// Wraps a body in a `text/plain` response, like every endpoint here returns.
pub fn plain(body: impl Into<String>) -> impl IntoResponse {
    let body: String = body.into();
    ([(header::CONTENT_TYPE, "text/plain")], body)
}

/// GET / - name, version and project URL
pub async fn root() -> impl IntoResponse {
    plain(format!(
        "{} v{} ({})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_REPOSITORY")
    ))
}

/// GET /ping - liveness
pub async fn ping() -> impl IntoResponse {
    plain("pong")
}
