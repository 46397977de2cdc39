//! HTTP surface using Axum
//!
//! Serves the Prometheus scrape endpoint and a liveness check.

pub mod handlers;
mod routes;

pub use handlers::ExporterState;

use axum::Router;
use tower_http::trace::TraceLayer;

/// Create the complete application router.
pub fn create_app(state: ExporterState) -> Router {
    routes::exporter_routes(state).layer(TraceLayer::new_for_http())
}
