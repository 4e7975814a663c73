//! HTTP server for metrics and the current code.

use crate::metrics::MetricsRegistry;
use crate::regeneration::PasswordGenerator;
use crate::store::{current_code, RecordStore};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;

/// Errors that can occur during server operations.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    #[error("server error: {0}")]
    Server(String),
}

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    /// Address to bind the server to.
    pub bind_addr: SocketAddr,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], 9090).into(),
        }
    }
}

impl HttpServerConfig {
    /// Creates a config with a custom port.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], port).into(),
        }
    }
}

/// Shared state for the handlers.
struct ServerState {
    registry: Arc<MetricsRegistry>,
    store: Arc<dyn RecordStore>,
    passwords: Option<Arc<PasswordGenerator>>,
}

/// HTTP server exposing metrics, the current code and password generation.
pub struct HttpServer {
    config: HttpServerConfig,
    registry: Arc<MetricsRegistry>,
    store: Arc<dyn RecordStore>,
    passwords: Option<Arc<PasswordGenerator>>,
}

impl HttpServer {
    /// Creates a new server.
    pub fn new(
        config: HttpServerConfig,
        registry: Arc<MetricsRegistry>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            config,
            registry,
            store,
            passwords: None,
        }
    }

    /// Enables `POST /password`.
    pub fn with_passwords(mut self, passwords: Arc<PasswordGenerator>) -> Self {
        self.passwords = Some(passwords);
        self
    }

    /// Builds the router without binding.
    pub fn router(&self) -> Router {
        let state = Arc::new(ServerState {
            registry: Arc::clone(&self.registry),
            store: Arc::clone(&self.store),
            passwords: self.passwords.clone(),
        });

        Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .route("/mfa", get(current_code_handler))
            .route("/password", post(password_handler))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Starts the HTTP server.
    ///
    /// This method runs the server until it is shut down.
    pub async fn run(self) -> Result<(), ServerError> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        tracing::info!(
            addr = %self.config.bind_addr,
            "HTTP server listening"
        );

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Server(e.to_string()))?;

        Ok(())
    }
}

/// JSON error body shared by the API routes.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: error.into() })).into_response()
}

/// Handler for the /metrics endpoint.
async fn metrics_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    match state.registry.encode() {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {}", e),
        ),
    }
}

/// Handler for the /health endpoint.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Handler for the /mfa endpoint.
async fn current_code_handler(State(state): State<Arc<ServerState>>) -> Response {
    match current_code(state.store.as_ref(), Utc::now()).await {
        Ok(Some(code)) => Json(code).into_response(),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            "No valid MFA code found (generating...)",
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read current code");
            error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PasswordRequest {
    #[serde(default)]
    length: Option<i64>,
}

/// Handler for the /password endpoint.
///
/// The JSON body is optional. A missing or malformed body falls back to
/// the policy's default length.
async fn password_handler(
    State(state): State<Arc<ServerState>>,
    body: Option<Json<PasswordRequest>>,
) -> Response {
    let passwords = match &state.passwords {
        Some(passwords) => passwords,
        None => return error_response(StatusCode::NOT_FOUND, "Password generation disabled"),
    };

    let request = body.map(|Json(request)| request).unwrap_or_default();
    match passwords.generate(request.length).await {
        Ok(generated) => Json(generated).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Password generation failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keygen::LengthPolicy;
    use crate::regeneration::testing::{FailingTransform, FixedCollector, MemoryOutput, ReversingTransform};
    use crate::source::TransformService;
    use crate::store::{AuthCode, MemoryStore};
    use axum::body::{to_bytes, Body};
    use axum::extract::FromRequest;
    use axum::http::Request;
    use std::time::Duration;

    fn state_with(store: Arc<MemoryStore>) -> Arc<ServerState> {
        Arc::new(ServerState {
            registry: Arc::new(MetricsRegistry::new().unwrap()),
            store,
            passwords: None,
        })
    }

    fn state_with_passwords(transform: Arc<dyn TransformService>) -> Arc<ServerState> {
        let passwords = PasswordGenerator::new(
            Arc::new(FixedCollector::new("lava_3.jpg", b"LAMP1")),
            transform,
            Arc::new(MemoryOutput::new()),
            "wallpaper_",
            LengthPolicy::default(),
        );
        Arc::new(ServerState {
            registry: Arc::new(MetricsRegistry::new().unwrap()),
            store: Arc::new(MemoryStore::new()),
            passwords: Some(Arc::new(passwords)),
        })
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn password_body(body: &'static str) -> Option<Json<PasswordRequest>> {
        let request = Request::builder()
            .method("POST")
            .uri("/password")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        Option::<Json<PasswordRequest>>::from_request(request, &())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_current_code_not_found_when_empty() {
        let response = current_code_handler(State(state_with(Arc::new(MemoryStore::new())))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = json_body(response).await;
        assert_eq!(body["error"], "No valid MFA code found (generating...)");
    }

    #[tokio::test]
    async fn test_current_code_served() {
        let store = Arc::new(MemoryStore::new());
        let code = AuthCode::issue("seed".into(), "lava_1.jpg".into(), Utc::now(), Duration::from_secs(60));
        store.create(&code).await.unwrap();

        let response = current_code_handler(State(state_with(store))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["seed"], "seed");
        assert!(body["valid_until"].is_string());
    }

    #[tokio::test]
    async fn test_password_generation_disabled() {
        let response = password_handler(State(state_with(Arc::new(MemoryStore::new()))), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_password_uses_requested_length() {
        let body = password_body(r#"{"length": 24}"#).await;
        let response = password_handler(State(state_with_passwords(Arc::new(ReversingTransform))), body).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["password"].as_str().unwrap().len(), 24);
        assert_eq!(body["entropy_bits"], 146);
        assert_eq!(body["s3_key"], "lava_3.jpg");
        assert!(body["wallpaper_s3_key"].as_str().unwrap().starts_with("wallpaper_"));
    }

    #[tokio::test]
    async fn test_malformed_password_body_uses_default_length() {
        let state = state_with_passwords(Arc::new(ReversingTransform));

        for raw in [r#"{"length": "abc"}"#, "not json", ""] {
            let body = password_body(raw).await;
            assert!(body.is_none());

            let response = password_handler(State(Arc::clone(&state)), body).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(json_body(response).await["password"].as_str().unwrap().len(), 20);
        }
    }

    #[tokio::test]
    async fn test_password_failure_is_json_error() {
        let response = password_handler(State(state_with_passwords(Arc::new(FailingTransform))), None).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json_body(response)
            .await["error"]
            .as_str()
            .unwrap()
            .starts_with("image transform failed"));
    }

    #[test]
    fn test_config_default() {
        let config = HttpServerConfig::default();
        assert_eq!(config.bind_addr.port(), 9090);
    }

    #[test]
    fn test_config_with_port() {
        let config = HttpServerConfig::with_port(8080);
        assert_eq!(config.bind_addr.port(), 8080);
    }
}
