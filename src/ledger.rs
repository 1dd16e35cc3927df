use axum::http::{HeaderMap, HeaderValue, header};
use clap::ValueEnum;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use thiserror::Error;
use tracing::{debug, error};

use crate::rate_limit::{Decision, RateLimitPolicy, RateLimitState, evaluate};

pub const COOKIE_NAME: &str = "rateLimit";

// Upper bound between sweeps of expired in-memory entries
const SWEEP_INTERVAL_MILLIS: i64 = 60_000;

// Where the per-caller ledger lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LedgerMode {
    // client-held cookie, server keeps nothing
    Cookie,
    // in-process map keyed by caller ip
    Memory,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to serialize ledger: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid cookie header: {0}")]
    Header(#[from] axum::http::header::InvalidHeaderValue),
}

// Result of one admission check
pub struct Admission {
    pub decision: Decision,
    pub set_cookie: Option<HeaderValue>, // only in cookie mode, only on accept
}

pub enum Ledger {
    Cookie,
    Memory(MemoryLedger),
}

/// Server-side ledger keyed by caller identity.
///
/// Entries whose window has expired are swept periodically, so rotating
/// identities cannot grow the map past what one window admits.
#[derive(Default)]
pub struct MemoryLedger {
    entries: DashMap<String, RateLimitState>,
    last_sweep: AtomicI64,
}

impl MemoryLedger {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, caller: &str) -> Option<RateLimitState> {
        self.entries.get(caller).map(|e| *e)
    }

    fn admit(&self, caller: &str, now: i64, policy: &RateLimitPolicy) -> Decision {
        self.sweep(now, policy);

        // entry guard holds the shard lock across read + update
        let mut entry = self.entries.entry(caller.to_string()).or_default();
        let decision = evaluate(&entry, now, policy);
        if let Decision::Accept { state, .. } = decision {
            *entry = state;
        }
        decision
    }

    // Drops entries that would be treated as expired anyway
    fn sweep(&self, now: i64, policy: &RateLimitPolicy) {
        let interval = SWEEP_INTERVAL_MILLIS.min(policy.window_millis);
        let last = self.last_sweep.load(Ordering::Relaxed);
        if now.saturating_sub(last) < interval {
            return;
        }
        // one sweeper per interval
        if self
            .last_sweep
            .compare_exchange(last, now, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        let before = self.entries.len();
        self.entries
            .retain(|_, s| now.saturating_sub(s.last_request_time) <= policy.window_millis);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, remaining = self.entries.len(), "swept expired rate limit entries");
        }
    }
}

impl Ledger {
    pub fn new(mode: LedgerMode) -> Self {
        match mode {
            LedgerMode::Cookie => Ledger::Cookie,
            LedgerMode::Memory => Ledger::Memory(MemoryLedger::default()),
        }
    }

    /// Loads the caller's prior state, evaluates the request and persists
    /// the new state when it is accepted.
    pub fn admit(
        &self,
        caller: &str,
        headers: &HeaderMap,
        now: i64,
        policy: &RateLimitPolicy,
    ) -> Admission {
        match self {
            Ledger::Cookie => {
                let prior = read_cookie(headers);
                let decision = evaluate(&prior, now, policy);
                let set_cookie = match decision {
                    Decision::Accept { state, .. } => {
                        match encode_cookie(&state, policy.window_secs()) {
                            Ok(v) => Some(v),
                            Err(e) => {
                                error!(caller = %caller, error = %e, "could not encode rate limit cookie");
                                None
                            }
                        }
                    }
                    Decision::Reject { .. } => None,
                };
                Admission {
                    decision,
                    set_cookie,
                }
            }
            Ledger::Memory(memory) => Admission {
                decision: memory.admit(caller, now, policy),
                set_cookie: None,
            },
        }
    }
}

/// Reads the `rateLimit` cookie. Missing or unparseable values yield the default state.
pub fn read_cookie(headers: &HeaderMap) -> RateLimitState {
    let raw = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, value)| value);

    match raw {
        Some(value) => parse_state(value).unwrap_or_else(|| {
            debug!(cookie = value, "ignoring malformed rate limit cookie");
            RateLimitState::default()
        }),
        None => RateLimitState::default(),
    }
}

// Accepts both url-encoded and bare json
pub fn parse_state(raw: &str) -> Option<RateLimitState> {
    let decoded = urlencoding::decode(raw).ok()?;
    serde_json::from_str(&decoded).ok()
}

pub fn encode_cookie(state: &RateLimitState, max_age_secs: i64) -> Result<HeaderValue, LedgerError> {
    let json = serde_json::to_string(state)?;
    let cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly",
        COOKIE_NAME,
        urlencoding::encode(&json),
        max_age_secs
    );
    Ok(HeaderValue::from_str(&cookie)?)
}
