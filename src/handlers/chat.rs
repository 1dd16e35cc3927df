use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::ChatError;
use crate::identity::caller_ip;
use crate::metrics::{REQUEST_LATENCY, REQUEST_TOTAL, THROTTLED_TOTAL, UPSTREAM_FAILURES};
use crate::models::{ChatMessage, ChatResponse, NO_RESPONSE, Role};
use crate::rate_limit::Decision;
use crate::state::AppState;

// Only the server gets to speak as the system
fn validate_history(history: &[ChatMessage]) -> Result<(), ChatError> {
    match history.iter().position(|m| m.role == Role::System) {
        Some(idx) => Err(ChatError::InvalidHistory(format!(
            "message {idx} uses the reserved system role"
        ))),
        None => Ok(()),
    }
}

pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<Vec<ChatMessage>>, JsonRejection>,
) -> Response {
    REQUEST_TOTAL.inc();
    let caller = caller_ip(&headers);

    let history = match body {
        Ok(Json(history)) => history,
        Err(rejection) => {
            let e = ChatError::from(rejection);
            warn!(caller = %caller, error = %e, "rejecting chat request");
            return e.into_response();
        }
    };

    if let Err(e) = validate_history(&history) {
        warn!(caller = %caller, error = %e, "rejecting chat request");
        return e.into_response();
    }

    let now = state.clock.now_millis();
    let admission = state.ledger.admit(&caller, &headers, now, &state.policy);

    let remaining = match admission.decision {
        Decision::Reject {
            time_until_reset_minutes,
        } => {
            THROTTLED_TOTAL.inc();
            info!(caller = %caller, minutes = time_until_reset_minutes, "rate limit exceeded");
            return ChatError::Throttled {
                minutes: time_until_reset_minutes,
            }
            .into_response();
        }
        Decision::Accept {
            state: ledger,
            remaining,
        } => {
            debug!(caller = %caller, count = ledger.count, remaining, "request admitted");
            remaining
        }
    };

    let start_time = Instant::now();

    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::system(state.system_prompt.as_str()));
    messages.extend(history);

    let result = match state.gateway.complete(&messages).await {
        Ok(text) => {
            let text = text.unwrap_or_else(|| {
                warn!(caller = %caller, "completion returned no content");
                NO_RESPONSE.to_string()
            });
            Ok(Json(ChatResponse::reply(text, remaining)))
        }
        Err(e) => {
            UPSTREAM_FAILURES.inc();
            error!(caller = %caller, turns = messages.len(), error = %e, "error generating response");
            Err(ChatError::from(e))
        }
    };

    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());

    // the attempt consumed a slot either way, so the ledger goes out on failures too
    let mut response = result.into_response();
    if let Some(cookie) = admission.set_cookie {
        response.headers_mut().insert(SET_COOKIE, cookie);
    }
    response
}
