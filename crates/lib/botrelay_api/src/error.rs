//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use botrelay_core::gateway::{GatewayError, ValidationError};
use serde_json::json;
use thiserror::Error;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Message and botType are required")]
    MissingFields {
        message: Option<String>,
        bot_type: Option<String>,
    },

    #[error("Invalid bot type: {requested}")]
    InvalidBotType {
        requested: String,
        valid_types: Vec<String>,
    },

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Failure inside the gateway that the fallback path cannot cover.
    #[error("Internal server error: {0}")]
    Internal(String),

    /// A handler panicked.
    #[error("Unhandled error: {0}")]
    Unhandled(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::MissingFields { message, bot_type } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Message and botType are required",
                    "received": { "message": message, "botType": bot_type },
                }),
            ),
            AppError::InvalidBotType { valid_types, .. } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid bot type", "validTypes": valid_types }),
            ),
            AppError::InvalidBody(details) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid request body", "details": details }),
            ),
            AppError::NotFound(path) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "Not Found", "path": path }),
            ),
            AppError::Internal(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "An error occurred while processing your request",
                    "details": details,
                }),
            ),
            AppError::Unhandled(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Something went wrong", "details": details }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Validation(ValidationError::MissingFields { message, bot_type }) => {
                AppError::MissingFields { message, bot_type }
            }
            GatewayError::Validation(ValidationError::UnknownBot {
                requested,
                valid_types,
            }) => AppError::InvalidBotType {
                requested,
                valid_types,
            },
            GatewayError::Internal(details) => AppError::Internal(details),
        }
    }
}
