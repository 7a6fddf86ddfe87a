use axum::http::StatusCode;
use tracing::error;

/// Log the full error chain and hide it from the client.
pub fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %format!("{e:#}"), "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".into(),
    )
}
