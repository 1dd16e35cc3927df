use serde::{Deserialize, Serialize};

// Literal used when the upstream answers without content
pub const NO_RESPONSE: &str = "No response";

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

// One chat turn, as sent by the UI and forwarded upstream
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
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

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// JSON body returned by `POST /api/chat`.
///
/// Successful replies carry `remainingRequests`, throttled ones carry
/// `timeUntilReset` (minutes), failures carry neither.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub error: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_requests: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_until_reset: Option<i64>,
}

impl ChatResponse {
    pub fn reply(message: String, remaining_requests: i64) -> Self {
        Self {
            error: false,
            message,
            remaining_requests: Some(remaining_requests),
            time_until_reset: None,
        }
    }

    pub fn throttled(time_until_reset: i64) -> Self {
        Self {
            error: true,
            message: "Too many requests, please try again later.".to_string(),
            remaining_requests: None,
            time_until_reset: Some(time_until_reset),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
            remaining_requests: None,
            time_until_reset: None,
        }
    }
}

// Upstream chat-completions request format
#[derive(Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
}

// Upstream chat-completions response format (only the fields we read)
#[derive(Deserialize, Debug)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Deserialize, Debug)]
pub struct CompletionChoice {
    pub message: Option<CompletionMessage>,
}

#[derive(Deserialize, Debug)]
pub struct CompletionMessage {
    pub content: Option<String>,
}
