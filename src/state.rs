use std::sync::Arc;
use crate::clock::Clock;
use crate::gateway::CompletionGateway;
use crate::ledger::Ledger;
use crate::rate_limit::RateLimitPolicy;

// app's shared state
pub struct AppState {
    pub gateway: Arc<dyn CompletionGateway>,
    pub ledger: Ledger,
    pub policy: RateLimitPolicy, // limit + window, fixed at startup
    pub system_prompt: String,   // prepended to every history
    pub clock: Arc<dyn Clock>,
}
