// src/routes.rs

use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{health, quiz},
    state::AppState,
};

/// Assembles the application router.
///
/// * `POST /generate-quiz` and `GET /health`.
/// * Applies global middleware (Trace, CORS open to all origins).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/generate-quiz", post(quiz::generate_quiz))
        .route("/health", get(health::health))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        services::completion::{CompletionError, CompletionService},
    };
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use std::{net::IpAddr, sync::Arc, time::Duration};
    use tower::ServiceExt;

    struct Echo;

    #[async_trait]
    impl CompletionService for Echo {
        async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            Ok(r#"[{"question":"Q?","options":["a","b","c","d"],"correctIndex":2}]"#.to_string())
        }
    }

    fn app() -> Router {
        let config = Config {
            gemini_api_key: "unused".to_string(),
            gemini_model: "echo-model".to_string(),
            gemini_base_url: "http://127.0.0.1:1".to_string(),
            ngrok_authtoken: None,
            ngrok_bin: "ngrok".to_string(),
            ngrok_api_url: "http://127.0.0.1:1".to_string(),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            generation_timeout: Duration::from_secs(5),
            max_inflight_generations: 2,
            rust_log: "error".to_string(),
        };
        create_router(AppState::new(config, Arc::new(Echo)))
    }

    #[tokio::test]
    async fn health_reports_model() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["model"], "echo-model");
        assert_eq!(value["timeout_secs"], 5);
        assert_eq!(value["available_slots"], 2);
    }

    #[tokio::test]
    async fn preflight_allows_any_origin() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/generate-quiz")
                    .header(header::ORIGIN, "https://example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn generate_quiz_relays_model_json() {
        let response = app()
            .oneshot(
                Request::post("/generate-quiz")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"topic":"Rust"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value[0]["correctIndex"], 2);
    }
}
