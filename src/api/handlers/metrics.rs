//! Prometheus scrape endpoint

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::error;

use super::ExporterState;
use crate::collector::CONTENT_TYPE;

/// GET /metrics
///
/// Runs one collection cycle against Druid and returns the task gauge
/// family in Prometheus text format (version 0.0.4).
///
/// A failed upstream query or decode answers `502 Bad Gateway` with the
/// error as a plain-text body; the exporter keeps serving.
pub async fn get_metrics(State(state): State<ExporterState>) -> Response {
    match state.collector.scrape().await {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!(source = %state.collector.source_name(), error = %e, "Scrape failed");
            (
                e.status_code(),
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                e.to_string(),
            )
                .into_response()
        }
    }
}
