//! HTTP API server for integration with other systems.
//!
//! Exposes the question-answering pipeline as a small JSON API.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::Answer;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let orchestrator = Orchestrator::new(&settings)?;
    let app = router(Arc::new(AppState { orchestrator }));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("vidqa API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Welcome", "GET  /");
    Output::kv("Health", "GET  /health");
    Output::kv("Chat", "POST /chat");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/chat", post(chat))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct ChatRequest {
    video_id: String,
    question: String,
}

#[derive(Serialize)]
struct ChatResponse {
    answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    available: Option<bool>,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

// === Handlers ===

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "Welcome to YouTube RAG Chatbot API" }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn chat(State(state): State<Arc<AppState>>, Json(req): Json<ChatRequest>) -> Response {
    info!("Chat request for {}", req.video_id);

    match state.orchestrator.run(&req.video_id, &req.question).await {
        Ok(Answer::Grounded { text, .. }) => (
            StatusCode::OK,
            Json(ChatResponse {
                answer: text,
                available: None,
            }),
        )
            .into_response(),
        Ok(Answer::Unavailable { reason }) => (
            StatusCode::OK,
            Json(ChatResponse {
                answer: reason,
                available: Some(false),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Chat request for {} failed: {}", req.video_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    detail: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::RecursiveChunker;
    use crate::embedding::HashingEmbedder;
    use crate::error::{Result, VidqaError};
    use crate::rag::LanguageModel;
    use crate::retry::RetryPolicy;
    use crate::transcript::{
        FetchedTranscript, TranscriptFetcher, TranscriptSnippet, TranscriptSource, Translator,
    };
    use async_trait::async_trait;
    use std::time::Duration;

    struct FixedSource;

    #[async_trait]
    impl TranscriptSource for FixedSource {
        async fn fetch(&self, video_id: &str, _language: Option<&str>) -> Result<FetchedTranscript> {
            match video_id {
                "aaaaaaaaaaa" => Ok(FetchedTranscript {
                    language_code: "en".to_string(),
                    is_generated: true,
                    snippets: vec![TranscriptSnippet::new("The sky is blue.", 0.0, 2.0)],
                }),
                "eeeeeeeeeee" => Ok(FetchedTranscript {
                    language_code: "en".to_string(),
                    is_generated: true,
                    snippets: vec![],
                }),
                _ => Err(VidqaError::TranscriptsDisabled(video_id.to_string())),
            }
        }
    }

    struct EnglishOnly;

    #[async_trait]
    impl Translator for EnglishOnly {
        async fn detect(&self, _text: &str) -> Result<String> {
            Ok("en".to_string())
        }

        async fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String> {
            Ok(text.to_string())
        }
    }

    struct Parrot;

    #[async_trait]
    impl LanguageModel for Parrot {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok("It is blue.".to_string())
        }

        fn model_name(&self) -> &str {
            "parrot"
        }
    }

    fn state() -> Arc<AppState> {
        let fetcher = TranscriptFetcher::new(Arc::new(FixedSource), Arc::new(EnglishOnly));
        let orchestrator = Orchestrator::with_components(
            fetcher,
            Arc::new(RecursiveChunker::new()),
            Arc::new(HashingEmbedder::default()),
            Arc::new(Parrot),
        )
        .with_retry(RetryPolicy::new(Duration::from_secs(5), 0));
        Arc::new(AppState { orchestrator })
    }

    async fn post_chat(video_id: &str) -> (StatusCode, serde_json::Value) {
        let response = chat(
            State(state()),
            Json(ChatRequest {
                video_id: video_id.to_string(),
                question: "What color is the sky?".to_string(),
            }),
        )
        .await;

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_root_message() {
        let response = root().await.into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["message"], "Welcome to YouTube RAG Chatbot API");
    }

    #[tokio::test]
    async fn test_chat_answers() {
        let (status, body) = post_chat("aaaaaaaaaaa").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "answer": "It is blue." }));
    }

    #[tokio::test]
    async fn test_chat_reports_unavailable_transcript() {
        let (status, body) = post_chat("ddddddddddd").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "Transcript not available (subtitles disabled).");
        assert_eq!(body["available"], false);
    }

    #[tokio::test]
    async fn test_chat_failure_is_500_with_detail() {
        let (status, body) = post_chat("eeeeeeeeeee").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"].as_str().unwrap().contains("empty"));
    }

    #[test]
    fn test_router_builds() {
        let _ = router(state());
    }
}
