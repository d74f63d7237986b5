pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;

pub use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/scan", get(routes::start_scan))
        .route("/api/scan/:scan_id/control", post(routes::control_scan))
        .route("/api/scan/:scan_id/progress", get(routes::scan_progress))
        .route("/api/scan/status", get(routes::server_status))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use webcrawl_core::config::{AppConfig, ScanDefaultsConfig, ServerConfig};

    fn test_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            scan_defaults: ScanDefaultsConfig {
                default_max_pages: 50,
                default_max_depth: 3,
                default_workers: 5,
                max_workers: 10,
                default_timeout_secs: 100,
                default_request_timeout_secs: 15,
                queue_timeout_secs: 2,
                grace_period_secs: 5,
                min_delay_ms: 1,
                max_delay_ms: 2,
            },
        }
    }

    #[tokio::test]
    async fn status_endpoint_reports_readiness() {
        let app = router(AppState::new(test_config()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/scan/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["ready"], true);
        assert_eq!(json["max_workers"], 10);
    }

    #[tokio::test]
    async fn scan_requires_domain_param() {
        let app = router(AppState::new(test_config()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/scan")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn control_unknown_scan_is_not_found() {
        let app = router(AppState::new(test_config()));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/scan/does-not-exist/control")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"action":"pause"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
    }
}
