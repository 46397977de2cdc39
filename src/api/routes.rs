//! API route definitions
//!
//! - `GET /metrics`: Druid task gauges
//! - `GET /`: liveness, also the fallback for any other path

use axum::{routing::get, Router};

use super::handlers::{self, ExporterState};

pub fn exporter_routes(state: ExporterState) -> Router {
    Router::new()
        .route("/metrics", get(handlers::get_metrics))
        .route("/", get(handlers::liveness))
        .fallback(handlers::liveness)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{GaugeFamily, TaskCollector};
    use crate::config::MetricConfig;
    use crate::druid::StaticSource;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn create_test_state() -> ExporterState {
        ExporterState::new(TaskCollector::new(
            Arc::new(StaticSource::default()),
            None,
            GaugeFamily::from_config(&MetricConfig::default()),
        ))
    }

    #[tokio::test]
    async fn test_unrouted_path_answers_liveness() {
        let app = exporter_routes(create_test_state());
        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_metrics_route_exists() {
        let app = exporter_routes(create_test_state());
        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
