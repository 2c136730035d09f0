use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;

/// Operational endpoints merged ahead of the role-scoped API.
pub(crate) fn with_operational_routes(api: Router) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .merge(api)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use campus_nest::config::DeadlineConfig;
    use campus_nest::{api_router, ApiState, InMemoryEntityStore};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::watch;
    use tower::ServiceExt;

    fn app(ready: bool) -> (Router, watch::Sender<bool>) {
        let (shutdown, receiver) = watch::channel(false);
        let state = ApiState::new(
            Arc::new(InMemoryEntityStore::new()),
            DeadlineConfig::default(),
            receiver,
        );
        let app_state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        let router =
            with_operational_routes(api_router(Arc::new(state))).layer(Extension(app_state));
        (router, shutdown)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let (router, _shutdown) = app(false);
        let response = router
            .oneshot(get_request("/ready"))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let (router, _shutdown) = app(true);
        let response = router
            .oneshot(get_request("/ready"))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024).await.expect("body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload["status"], "ready");
    }

    #[tokio::test]
    async fn health_and_api_share_one_router() {
        let (router, _shutdown) = app(true);
        let response = router
            .clone()
            .oneshot(get_request("/health"))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(get_request("/api/v1/tpo/analytics"))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn metrics_endpoint_uses_prometheus_text_format() {
        let (router, _shutdown) = app(true);
        let response = router
            .oneshot(get_request("/metrics"))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }

    #[test]
    fn readiness_flag_is_shared() {
        let flag = Arc::new(AtomicBool::new(false));
        let state = AppState {
            readiness: flag.clone(),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        flag.store(true, Ordering::Release);
        assert!(state.readiness.load(Ordering::Acquire));
    }
}
