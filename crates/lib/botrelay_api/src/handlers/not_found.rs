//! Catch-all for unmatched routes and methods.

use axum::http::Uri;

use crate::error::AppError;

/// Any unmatched path or method → `404 { "error": "Not Found", "path": ... }`.
pub async fn not_found_handler(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
