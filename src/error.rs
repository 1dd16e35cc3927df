use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::gateway::GatewayError;
use crate::models::ChatResponse;

// Shown to callers instead of upstream details
pub const GENERIC_FAILURE: &str = "Error generating response";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("rate limit exceeded, resets in {minutes} minutes")]
    Throttled { minutes: i64 },

    #[error("invalid chat history: {0}")]
    InvalidHistory(String),

    #[error("malformed request body: {0}")]
    MalformedBody(#[from] JsonRejection),

    #[error("completion failed: {0}")]
    Upstream(#[from] GatewayError),
}

impl ChatError {
    pub fn status(&self) -> StatusCode {
        match self {
            ChatError::Throttled { .. } => StatusCode::TOO_MANY_REQUESTS,
            ChatError::InvalidHistory(_) => StatusCode::BAD_REQUEST,
            // 400 bad json, 415 wrong content type, 422 wrong shape
            ChatError::MalformedBody(rejection) => rejection.status(),
            ChatError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let body = match &self {
            ChatError::Throttled { minutes } => ChatResponse::throttled(*minutes),
            ChatError::InvalidHistory(reason) => ChatResponse::failure(reason.clone()),
            ChatError::MalformedBody(rejection) => ChatResponse::failure(rejection.body_text()),
            ChatError::Upstream(_) => ChatResponse::failure(GENERIC_FAILURE),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY is not set (pass --api-key or export it)")]
    MissingApiKey,
}
