//! API server configuration.

/// Configuration for the HTTP surface.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "0.0.0.0:3001").
    pub bind_addr: String,
    /// Install the per-request logging middleware.
    pub log_requests: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3001".into(),
            log_requests: true,
        }
    }
}
