//! Router middleware.

pub mod request_log;
