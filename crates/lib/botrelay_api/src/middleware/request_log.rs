//! Request logging middleware.
//!
//! Logs method and path of every request, and the body at debug level.
//! Installed only when `ApiConfig::log_requests` is set.

use axum::body::{Body, HttpBody, to_bytes};
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{Level, debug, info, warn};

/// Same as axum's default body limit; the JSON extractor rejects larger bodies anyway.
const MAX_LOGGED_BODY: usize = 2 * 1024 * 1024;

pub async fn log_request(request: Request, next: Next) -> Response {
    info!(method = %request.method(), path = %request.uri().path(), "request");

    if !tracing::enabled!(Level::DEBUG) {
        return next.run(request).await;
    }

    // Only bodies of known length within the limit are buffered; anything
    // else goes to the handler untouched.
    let fits = request
        .body()
        .size_hint()
        .upper()
        .is_some_and(|len| len <= MAX_LOGGED_BODY as u64);
    if !fits {
        debug!("request body not logged: length unknown or over limit");
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_LOGGED_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            // The stream itself failed; the handler would have hit the same error.
            warn!(error = %e, "could not buffer request body for logging");
            Default::default()
        }
    };
    if !bytes.is_empty() {
        debug!(body = %String::from_utf8_lossy(&bytes), "request body");
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
