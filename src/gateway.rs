use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::models::{ChatMessage, CompletionRequest, CompletionResponse};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("upstream timed out")]
    Timeout,
    #[error("invalid upstream response")]
    InvalidResponse,
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Timeout
        } else if let Some(status) = e.status() {
            GatewayError::Status(status.as_u16())
        } else if e.is_decode() {
            GatewayError::InvalidResponse
        } else {
            GatewayError::Http(e)
        }
    }
}

/// External completion service.
///
/// `Ok(None)` means the upstream answered but produced no text.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Option<String>, GatewayError>;
}

// OpenAI-compatible chat completions client
pub struct OpenAiGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiGateway {
    pub fn new(
        base_url: &str,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GatewayError::Http)?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionGateway for OpenAiGateway {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Option<String>, GatewayError> {
        debug!(endpoint = %self.endpoint, turns = messages.len(), "calling completion api");

        let body = CompletionRequest {
            model: &self.model,
            messages,
        };

        let res: CompletionResponse = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // no choices at all is a broken reply, an empty message is not
        let choice = res
            .choices
            .into_iter()
            .next()
            .ok_or(GatewayError::InvalidResponse)?;

        Ok(choice
            .message
            .and_then(|m| m.content)
            .filter(|text| !text.is_empty()))
    }
}
