//! OpenAI chat completions provider.
//!
//! Calls `{base_url}/chat/completions` with a single-choice request and
//! returns the content of the first choice. Works with any endpoint that
//! speaks the OpenAI chat completions wire format.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{ChatMessage, CompletionProvider, UpstreamError};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Connection settings for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    /// Bearer token. `None` makes every call fail with `MissingCredential`.
    pub api_key: Option<String>,
    pub model: String,
    /// API root, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    n: u8,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// Provider backed by the OpenAI chat completions API.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: Client,
    settings: OpenAiSettings,
    endpoint: String,
}

impl OpenAiProvider {
    pub fn new(settings: OpenAiSettings) -> Self {
        Self::with_client(Client::new(), settings)
    }

    pub fn with_client(client: Client, settings: OpenAiSettings) -> Self {
        let endpoint = format!(
            "{}/chat/completions",
            settings.base_url.trim_end_matches('/')
        );
        Self {
            client,
            settings,
            endpoint,
        }
    }

    pub fn settings(&self) -> &OpenAiSettings {
        &self.settings
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, UpstreamError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(UpstreamError::MissingCredential)?;

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&CompletionRequest {
                model: &self.settings.model,
                messages,
                n: 1,
            })
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UpstreamError::Unauthorized {
                    status: status.as_u16(),
                    body,
                },
                StatusCode::TOO_MANY_REQUESTS => UpstreamError::RateLimited(body),
                _ => UpstreamError::Status {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let data: CompletionResponse = resp
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(format!("response parse error: {e}")))?;

        data.choices
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::Malformed("response has no choices".to_string()))?
            .message
            .content
            .ok_or_else(|| UpstreamError::Malformed("first choice has no content".to_string()))
    }

    fn name(&self) -> &str {
        "openai"
    }
}
