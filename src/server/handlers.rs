use crate::ingest::IngestError;
use crate::server::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};

pub const HEALTH_BODY: &str = "Signal receiver is alive.";
pub const WEBHOOK_OK_BODY: &str = "Signals received successfully";

/// Liveness only; the store is not consulted.
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, HEALTH_BODY)
}

/// Accepts any content type: alerting sources often send JSON as `text/plain`.
pub async fn webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, &'static str), IngestError> {
    let report = state.ingestor.ingest(&body).await?;
    log::debug!("Webhook stored {} signal(s), skipped {}", report.written, report.skipped);
    Ok((StatusCode::OK, WEBHOOK_OK_BODY))
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        crate::metrics::render(),
    )
}
