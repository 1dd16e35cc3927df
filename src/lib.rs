pub mod clock;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod identity;
pub mod ledger;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::state::AppState;

// creating the router with routes
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/chat", post(handlers::chat_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(state)
}
