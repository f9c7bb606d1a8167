pub mod chat;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::Html,
    routing::{get, post},
};
use eyre::{Result, WrapErr};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::ollama_client::{LazyOllama, OllamaConfig};
use chat::ChatSession;

#[derive(Clone)]
pub struct AppState {
    session: Arc<Mutex<ChatSession>>,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

// GET /
async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

// GET /api/health
async fn health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "success",
        "data": "travel consultant is running"
    }))
}

// GET /api/welcome
async fn welcome() -> Json<Value> {
    Json(serde_json::json!({
        "status": "success",
        "data": chat::WELCOME_TEXT
    }))
}

// POST /api/chat
async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<Value> {
    let message = request.message.trim();
    if message.is_empty() {
        return Json(serde_json::json!({
            "status": "error",
            "message": "message must not be empty"
        }));
    }

    let mut session = state.session.lock().await;
    let reply = session.handle_message(message).await;

    Json(serde_json::json!({
        "status": "success",
        "data": {
            "reply": reply,
            "history_len": session.history_len()
        }
    }))
}

// POST /api/clear
async fn clear_handler(State(state): State<AppState>) -> Json<Value> {
    state.session.lock().await.reset();

    Json(serde_json::json!({
        "status": "success",
        "message": "Conversation cleared"
    }))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/api/welcome", get(welcome))
        .route("/api/chat", post(chat_handler))
        .route("/api/clear", post(clear_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(addr: SocketAddr, config: OllamaConfig) -> Result<()> {
    let generator = LazyOllama::new(config);
    let state = AppState {
        session: Arc::new(Mutex::new(ChatSession::new(Box::new(generator)))),
    };

    let app = router(state);

    info!("Web server listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("Failed to bind to address {addr}"))?;

    axum::serve(listener, app)
        .await
        .wrap_err("Web server failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::ollama_client::{GenerateError, TextGenerator};

    struct CannedGenerator;

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
            Ok("去京都吧。".to_string())
        }
    }

    fn test_state() -> AppState {
        AppState {
            session: Arc::new(Mutex::new(ChatSession::new(Box::new(CannedGenerator)))),
        }
    }

    #[tokio::test]
    async fn chat_handler_replies_and_reports_history_length() {
        let state = test_state();
        let request = ChatRequest {
            message: "推薦日本行程".to_string(),
        };

        let Json(body) = chat_handler(State(state), Json(request)).await;

        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["reply"], "去京都吧。");
        assert_eq!(body["data"]["history_len"], 2);
    }

    #[tokio::test]
    async fn chat_handler_rejects_blank_messages() {
        let state = test_state();
        let request = ChatRequest {
            message: "   ".to_string(),
        };

        let Json(body) = chat_handler(State(state.clone()), Json(request)).await;

        assert_eq!(body["status"], "error");
        assert_eq!(state.session.lock().await.history_len(), 0);
    }

    #[tokio::test]
    async fn clear_handler_resets_the_session() {
        let state = test_state();
        let request = ChatRequest {
            message: "hi".to_string(),
        };
        let Json(chat_body) = chat_handler(State(state.clone()), Json(request)).await;
        assert_eq!(chat_body["data"]["history_len"], 2);

        let Json(body) = clear_handler(State(state.clone())).await;

        assert_eq!(body["status"], "success");
        assert_eq!(state.session.lock().await.history_len(), 0);
    }

    #[tokio::test]
    async fn welcome_returns_the_canned_greeting() {
        let Json(body) = welcome().await;

        assert_eq!(body["status"], "success");
        assert!(body["data"].as_str().unwrap().contains("AI 旅遊顧問"));
    }
}
