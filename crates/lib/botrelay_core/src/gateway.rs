//! Chat gateway — validates a request, relays it upstream and degrades to a
//! canned reply when the upstream call fails.
//!
//! Per request the gateway moves through:
//!
//! ```text
//! RECEIVED → VALIDATED → UPSTREAM_OK     → RESPONDED_LIVE
//!                      → UPSTREAM_FAILED → RESPONDED_FALLBACK
//!          → VALIDATION_FAILED
//!          → INTERNAL_FAILURE
//! ```
//!
//! Upstream failures never escape [`Gateway::handle`] while fallback is
//! enabled; only validation and internal failures are returned as errors.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep_until, timeout_at};
use tracing::{debug, info, warn};

use crate::bots::{BotProfile, BotRegistry};
use crate::config::GatewayConfig;
use crate::picker::{RandomPicker, ReplyPicker};
use crate::provider::{ChatMessage, CompletionProvider, OpenAiProvider, UpstreamError};

/// Note attached to replies served from the fallback set.
pub const FALLBACK_NOTE: &str = "Using fallback response due to API issues";

const RETRY_BACKOFF: Duration = Duration::from_millis(250);

// Stand-in deadline for timeouts too large to add to `Instant::now()`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// An inbound chat request, as received. Both fields may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: Option<String>,
    pub bot_type: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, bot_type: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            bot_type: Some(bot_type.into()),
        }
    }
}

/// How a reply was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Live,
    Fallback,
}

/// The gateway's answer to a well-formed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub bot_id: String,
    pub message: String,
    /// Present only for fallback replies.
    pub note: Option<String>,
    pub resolution: Resolution,
}

impl ChatReply {
    pub fn is_fallback(&self) -> bool {
        self.resolution == Resolution::Fallback
    }
}

/// A request rejected before any upstream call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Message and botType are required")]
    MissingFields {
        message: Option<String>,
        bot_type: Option<String>,
    },

    #[error("Invalid bot type")]
    UnknownBot {
        requested: String,
        valid_types: Vec<String>,
    },
}

/// Errors returned by [`Gateway::handle`].
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// The single request-handling component.
///
/// Holds only immutable state, so one instance is shared across all
/// concurrent requests.
#[derive(Clone)]
pub struct Gateway {
    config: GatewayConfig,
    provider: Arc<dyn CompletionProvider>,
    picker: Arc<dyn ReplyPicker>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("provider", &self.provider.name())
            .field("bots", &self.config.registry.ids())
            .field("fallback_enabled", &self.config.fallback_enabled)
            .finish()
    }
}

impl Gateway {
    pub fn new(
        config: GatewayConfig,
        provider: Arc<dyn CompletionProvider>,
        picker: Arc<dyn ReplyPicker>,
    ) -> Self {
        Self {
            config,
            provider,
            picker,
        }
    }

    /// Gateway backed by the OpenAI provider and a random picker.
    pub fn from_config(config: GatewayConfig) -> Self {
        let provider = Arc::new(OpenAiProvider::new(config.openai.clone()));
        Self::new(config, provider, Arc::new(RandomPicker))
    }

    pub fn registry(&self) -> &BotRegistry {
        &self.config.registry
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Resolve the request's profile and message, or say why it is invalid.
    pub fn validate<'a>(
        &'a self,
        request: &ChatRequest,
    ) -> Result<(&'a BotProfile, String), ValidationError> {
        let message = request
            .message
            .as_deref()
            .filter(|m| !m.trim().is_empty());
        let bot_type = request
            .bot_type
            .as_deref()
            .filter(|b| !b.trim().is_empty());

        let (Some(message), Some(bot_type)) = (message, bot_type) else {
            return Err(ValidationError::MissingFields {
                message: request.message.clone(),
                bot_type: request.bot_type.clone(),
            });
        };

        let profile =
            self.config
                .registry
                .get(bot_type)
                .ok_or_else(|| ValidationError::UnknownBot {
                    requested: bot_type.to_string(),
                    valid_types: self.config.registry.ids(),
                })?;

        Ok((profile, message.to_string()))
    }

    /// Handle one chat request end to end.
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatReply, GatewayError> {
        let (profile, message) = self.validate(&request).inspect_err(|e| {
            debug!(error = %e, "chat request rejected");
        })?;

        info!(bot = %profile.id, chars = message.len(), "relaying chat request");

        let messages = [
            ChatMessage::system(profile.prompt.as_str()),
            ChatMessage::user(message),
        ];

        match self.call_upstream(&messages).await {
            Ok(reply) => {
                debug!(bot = %profile.id, provider = self.provider.name(), "live reply");
                Ok(ChatReply {
                    bot_id: profile.id.clone(),
                    message: reply,
                    note: None,
                    resolution: Resolution::Live,
                })
            }
            Err(e) => {
                warn!(
                    bot = %profile.id,
                    provider = self.provider.name(),
                    error = %e,
                    "upstream call failed"
                );
                if !self.config.fallback_enabled {
                    return Err(GatewayError::Internal(e.to_string()));
                }
                self.fallback(profile)
            }
        }
    }

    /// One bounded attempt, plus configured retries for transient failures.
    ///
    /// Attempts and backoffs share one deadline of `upstream_timeout` per
    /// attempt; once it passes, the last error is returned.
    async fn call_upstream(&self, messages: &[ChatMessage]) -> Result<String, UpstreamError> {
        let per_attempt = self.config.upstream_timeout;
        let attempts = self.config.upstream_retries.saturating_add(1);
        let now = Instant::now();
        let deadline = now
            .checked_add(per_attempt.saturating_mul(attempts))
            .unwrap_or(now + FAR_FUTURE);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let attempt_deadline = Instant::now()
                .checked_add(per_attempt)
                .map_or(deadline, |t| t.min(deadline));
            let call = self.provider.complete(messages);
            let result = match timeout_at(attempt_deadline, call).await {
                Ok(result) => result,
                Err(_) => Err(UpstreamError::Timeout(per_attempt)),
            };

            match result {
                Err(e) if e.is_transient() && attempt < attempts => {
                    let resume = deadline.min(Instant::now() + RETRY_BACKOFF * attempt);
                    if resume >= deadline {
                        debug!(attempt, error = %e, "retry budget exhausted");
                        return Err(e);
                    }
                    debug!(attempt, max_attempts = attempts, error = %e, "retrying upstream");
                    sleep_until(resume).await;
                }
                other => return other,
            }
        }
    }

    fn fallback(&self, profile: &BotProfile) -> Result<ChatReply, GatewayError> {
        let count = profile.fallbacks.len();
        if count == 0 {
            return Err(GatewayError::Internal(format!(
                "bot '{}' has no fallback replies",
                profile.id
            )));
        }
        let index = self.picker.pick(count);
        let reply = profile.fallbacks.get(index).ok_or_else(|| {
            GatewayError::Internal(format!(
                "fallback index {index} out of range for bot '{}' ({count} replies)",
                profile.id
            ))
        })?;

        Ok(ChatReply {
            bot_id: profile.id.clone(),
            message: reply.clone(),
            note: Some(FALLBACK_NOTE.to_string()),
            resolution: Resolution::Fallback,
        })
    }
}
