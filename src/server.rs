//! Generative-AI proxy
//!
//! `GET /api/generate?query=...` forwards the query to the model and returns
//! the reply as plain text. `GET /health` answers `OK`.

use crate::errors::{FolioError, Result};
use crate::model::TextModel;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn TextModel>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateParams {
    pub query: Option<String>,
}

/// Error body `{error, status}`
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Upstream(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Upstream(m) => (StatusCode::BAD_GATEWAY, m),
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub fn router(model: Arc<dyn TextModel>) -> Router {
    Router::new()
        .route("/api/generate", get(generate))
        .route("/health", get(health))
        .with_state(AppState { model })
}

async fn generate(
    State(state): State<AppState>,
    Query(params): Query<GenerateParams>,
) -> std::result::Result<Response, ApiError> {
    let query = params.query.unwrap_or_default();
    let query = query.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("query parameter is required".to_string()));
    }

    match state.model.invoke(query).await {
        Ok(text) => Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response()),
        Err(e) => {
            error!(model = state.model.model_name(), error = %e, "generation failed");
            Err(ApiError::Upstream(format!("failed to generate content: {}", e)))
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

/// Bind and serve until the process is stopped
pub async fn serve(bind: &str, model: Arc<dyn TextModel>) -> Result<()> {
    let listener = TcpListener::bind(bind).await?;
    let addr = listener.local_addr()?;
    info!(%addr, model = model.model_name(), "proxy listening");

    axum::serve(listener, router(model))
        .await
        .map_err(|e| FolioError::Generic(format!("server error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatMessage;
    use async_trait::async_trait;

    struct Echo {
        fail: bool,
    }

    #[async_trait]
    impl TextModel for Echo {
        async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
            if self.fail {
                return Err(FolioError::EmptyResponse("no candidates".to_string()));
            }
            Ok(format!("echo: {}", messages[0].content))
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    async fn spawn(fail: bool) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(Arc::new(Echo { fail }))).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_generate_returns_text() {
        let base = spawn(false).await;
        let resp = reqwest::get(format!("{}/api/generate?query=hello", base)).await.unwrap();

        assert_eq!(resp.status(), 200);
        let content_type = resp.headers()[reqwest::header::CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/plain"));
        assert_eq!(resp.text().await.unwrap(), "echo: hello");
    }

    #[tokio::test]
    async fn test_blank_query_is_bad_request() {
        let base = spawn(false).await;
        for url in [format!("{}/api/generate", base), format!("{}/api/generate?query=%20", base)] {
            let resp = reqwest::get(url).await.unwrap();
            assert_eq!(resp.status(), 400);
            let body: serde_json::Value = resp.json().await.unwrap();
            assert_eq!(body["status"], 400);
            assert!(body["error"].as_str().unwrap().contains("query"));
        }
    }

    #[tokio::test]
    async fn test_model_failure_is_bad_gateway() {
        let base = spawn(true).await;
        let resp = reqwest::get(format!("{}/api/generate?query=hi", base)).await.unwrap();
        assert_eq!(resp.status(), 502);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], 502);
    }

    #[tokio::test]
    async fn test_health() {
        let base = spawn(false).await;
        let resp = reqwest::get(format!("{}/health", base)).await.unwrap();
        assert_eq!(resp.text().await.unwrap(), "OK");
    }
}
