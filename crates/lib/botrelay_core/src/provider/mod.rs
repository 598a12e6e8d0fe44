//! Completion providers — the upstream LLM seam.
//!
//! The gateway talks to upstream models only through [`CompletionProvider`],
//! so tests and alternative backends can stand in for the OpenAI client.

pub mod openai;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use openai::OpenAiProvider;

/// Role of a message in a completion exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One message sent to the upstream provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Any failure of the upstream completion call.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("No API key configured for the completion provider")]
    MissingCredential,

    #[error("Upstream request failed: {0}")]
    Network(String),

    #[error("Upstream request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Upstream rejected credentials: {status} {body}")]
    Unauthorized { status: u16, body: String },

    #[error("Upstream rate limit or quota exceeded: {0}")]
    RateLimited(String),

    #[error("Upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed upstream response: {0}")]
    Malformed(String),
}

impl UpstreamError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            UpstreamError::Network(_)
            | UpstreamError::Timeout(_)
            | UpstreamError::RateLimited(_) => true,
            UpstreamError::Status { status, .. } => *status >= 500,
            UpstreamError::MissingCredential
            | UpstreamError::Unauthorized { .. }
            | UpstreamError::Malformed(_) => false,
        }
    }
}

/// An upstream model that turns a message exchange into a single reply.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Request one completion and return the text of the first choice.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, UpstreamError>;

    /// Provider identifier for logging.
    fn name(&self) -> &str;
}
