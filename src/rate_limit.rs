use serde::{Deserialize, Serialize};
use std::time::Duration;

const MINUTE_MILLIS: i64 = 60_000;

// Rate limit state - the ledger a caller carries between requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitState {
    pub count: u32,
    pub last_request_time: i64, // ms since epoch
}

// Limit + window, fixed at startup
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    pub limit: u32,
    pub window_millis: i64,
}

impl RateLimitPolicy {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window_millis: i64::try_from(window.as_millis()).unwrap_or(i64::MAX),
        }
    }

    // Cookie max-age
    pub fn window_secs(&self) -> i64 {
        self.window_millis / 1000
    }

    pub fn remaining(&self, state: &RateLimitState) -> i64 {
        i64::from(self.limit) - i64::from(state.count)
    }
}

/// Outcome of checking one request against the caller's ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Request admitted; `state` must be persisted for the caller.
    Accept { state: RateLimitState, remaining: i64 },
    /// Over the limit. Nothing is persisted.
    Reject { time_until_reset_minutes: i64 },
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept { .. })
    }
}

/// Evaluates a request made at `now` against the `prior` ledger.
///
/// An expired window always admits and restarts at `count = 1`. Inside an
/// active window every accepted request moves `last_request_time` to `now`,
/// so the window slides with the most recent accepted call. Rejections leave
/// the ledger untouched.
pub fn evaluate(prior: &RateLimitState, now: i64, policy: &RateLimitPolicy) -> Decision {
    let elapsed = now.saturating_sub(prior.last_request_time);

    // window expired..? start a fresh one
    if elapsed > policy.window_millis {
        let state = RateLimitState {
            count: 1,
            last_request_time: now,
        };
        return Decision::Accept {
            remaining: policy.remaining(&state),
            state,
        };
    }

    let count = prior.count.saturating_add(1);

    // over limit
    if count > policy.limit {
        let until_reset = policy.window_millis.saturating_sub(elapsed);
        return Decision::Reject {
            time_until_reset_minutes: ceil_minutes(until_reset),
        };
    }

    let state = RateLimitState {
        count,
        last_request_time: now,
    };
    Decision::Accept {
        remaining: policy.remaining(&state),
        state,
    }
}

fn ceil_minutes(millis: i64) -> i64 {
    if millis <= 0 {
        return 0;
    }
    millis / MINUTE_MILLIS + i64::from(millis % MINUTE_MILLIS != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE_HOURS: i64 = 3 * 60 * 60 * 1000;
    const T: i64 = 1_700_000_000_000;

    fn policy(limit: u32) -> RateLimitPolicy {
        RateLimitPolicy::new(limit, Duration::from_millis(THREE_HOURS as u64))
    }

    #[test]
    fn expired_window_resets_regardless_of_prior_count() {
        for count in [0, 1, 5, 1_000] {
            let prior = RateLimitState {
                count,
                last_request_time: T,
            };
            let now = T + THREE_HOURS + 1;
            let decision = evaluate(&prior, now, &policy(3));
            assert_eq!(
                decision,
                Decision::Accept {
                    state: RateLimitState {
                        count: 1,
                        last_request_time: now
                    },
                    remaining: 2,
                }
            );
        }
    }

    #[test]
    fn exactly_window_elapsed_is_still_active() {
        let prior = RateLimitState {
            count: 1,
            last_request_time: T,
        };
        let decision = evaluate(&prior, T + THREE_HOURS, &policy(1));
        assert_eq!(
            decision,
            Decision::Reject {
                time_until_reset_minutes: 0
            }
        );
    }

    #[test]
    fn at_limit_rejects_without_touching_state() {
        let prior = RateLimitState {
            count: 3,
            last_request_time: T,
        };
        let decision = evaluate(&prior, T + 60_000, &policy(3));
        // no state to persist, wait measured from the last accepted call
        assert_eq!(
            decision,
            Decision::Reject {
                time_until_reset_minutes: 179
            }
        );
    }

    #[test]
    fn under_limit_increments_and_slides_window() {
        let prior = RateLimitState {
            count: 1,
            last_request_time: T,
        };
        let now = T + 5_000;
        match evaluate(&prior, now, &policy(3)) {
            Decision::Accept { state, remaining } => {
                assert_eq!(state.count, 2);
                assert_eq!(state.last_request_time, now);
                assert_eq!(remaining, 1);
            }
            other => panic!("expected accept, got {other:?}"),
        }
    }

    #[test]
    fn sliding_window_extends_expiry_from_last_accept() {
        let p = policy(2);
        let first = match evaluate(&RateLimitState::default(), T, &p) {
            Decision::Accept { state, .. } => state,
            other => panic!("expected accept, got {other:?}"),
        };
        // second accept two hours later moves the anchor
        let second = match evaluate(&first, T + 2 * 60 * 60 * 1000, &p) {
            Decision::Accept { state, .. } => state,
            other => panic!("expected accept, got {other:?}"),
        };
        // 3h after the first call the window is still active because of the second one
        let decision = evaluate(&second, T + THREE_HOURS + 1, &p);
        assert_eq!(
            decision,
            Decision::Reject {
                time_until_reset_minutes: 120
            }
        );
    }

    #[test]
    fn repeated_rejections_report_same_wait() {
        let prior = RateLimitState {
            count: 1,
            last_request_time: T,
        };
        let now = T + 42_000;
        let a = evaluate(&prior, now, &policy(1));
        let b = evaluate(&prior, now, &policy(1));
        assert_eq!(a, b);
    }

    #[test]
    fn single_request_per_three_hours_scenario() {
        let p = policy(1);

        let first = evaluate(&RateLimitState::default(), T, &p);
        let state = match first {
            Decision::Accept { state, remaining } => {
                assert_eq!(remaining, 0);
                state
            }
            other => panic!("expected accept, got {other:?}"),
        };
        assert_eq!(
            state,
            RateLimitState {
                count: 1,
                last_request_time: T
            }
        );

        let second = evaluate(&state, T + 1_000, &p);
        assert_eq!(
            second,
            Decision::Reject {
                time_until_reset_minutes: 180
            }
        );

        let later = evaluate(&state, T + THREE_HOURS + 1, &p);
        assert_eq!(
            later,
            Decision::Accept {
                state: RateLimitState {
                    count: 1,
                    last_request_time: T + THREE_HOURS + 1
                },
                remaining: 0,
            }
        );
    }

    #[test]
    fn forged_future_timestamp_does_not_overflow() {
        let prior = RateLimitState {
            count: u32::MAX,
            last_request_time: i64::MAX,
        };
        assert!(!evaluate(&prior, i64::MIN, &policy(1)).is_accept());
    }

    #[test]
    fn state_serializes_with_camel_case_fields() {
        let state = RateLimitState {
            count: 2,
            last_request_time: 99,
        };
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"count":2,"lastRequestTime":99}"#);
    }
}
