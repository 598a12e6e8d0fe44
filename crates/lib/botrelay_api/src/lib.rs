//! # botrelay_api
//!
//! HTTP API library for the bot relay gateway.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;

use std::any::Any;
use std::sync::Arc;

use axum::Router;
use axum::http::Method;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use botrelay_core::gateway::Gateway;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tracing::error;

use crate::config::ApiConfig;
use crate::error::AppError;
use crate::handlers::{chat, health, not_found};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The chat gateway; immutable and shared by every request.
    pub gateway: Arc<Gateway>,
    /// API configuration.
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(gateway: Gateway, config: ApiConfig) -> Self {
        Self {
            gateway: Arc::new(gateway),
            config,
        }
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    let log_requests = state.config.log_requests;

    let mut app = Router::new()
        .route(
            routes::GET_API_HEALTH,
            get(health::health_handler).fallback(not_found::not_found_handler),
        )
        .route(
            routes::API_CHAT,
            get(chat::chat_info_handler)
                .post(chat::chat_handler)
                .fallback(not_found::not_found_handler),
        )
        .fallback(not_found::not_found_handler)
        .with_state(state);

    if log_requests {
        app = app.layer(axum::middleware::from_fn(
            middleware::request_log::log_request,
        ));
    }

    app.layer(CatchPanicLayer::custom(panic_response)).layer(cors)
}

/// Converts a handler panic into the generic 500 body.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(%details, "request handler panicked");
    AppError::Unhandled(details).into_response()
}
