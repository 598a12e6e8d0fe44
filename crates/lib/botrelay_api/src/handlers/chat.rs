//! Chat relay handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use botrelay_core::gateway::{ChatReply, ChatRequest};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::routes;

/// Body of `POST /api/chat`. Fields are optional so absence is reported
/// as a validation error rather than a parse failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub bot_type: Option<String>,
}

impl From<ChatPayload> for ChatRequest {
    fn from(payload: ChatPayload) -> Self {
        ChatRequest {
            message: payload.message,
            bot_type: payload.bot_type,
        }
    }
}

/// Reply body. `note` is present only when the reply came from the fallback set.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl From<ChatReply> for ChatResponse {
    fn from(reply: ChatReply) -> Self {
        Self {
            message: reply.message,
            note: reply.note,
        }
    }
}

/// `POST /api/chat` — relay a message to the selected bot.
pub async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatPayload>, JsonRejection>,
) -> AppResult<Json<ChatResponse>> {
    let Json(payload) = payload.map_err(|e| AppError::InvalidBody(e.body_text()))?;
    let reply = state.gateway.handle(payload.into()).await?;
    Ok(Json(reply.into()))
}

/// `GET /api/chat` — discovery info for callers probing the endpoint.
pub async fn chat_info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Chat API is running. Please use POST method for chat requests.",
        "endpoints": {
            "health": format!("GET {}", routes::GET_API_HEALTH),
            "chat": format!("POST {}", routes::API_CHAT),
        },
        "botTypes": state.gateway.registry().ids(),
    }))
}
