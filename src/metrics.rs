use lazy_static::lazy_static;
use prometheus::{Counter, Histogram, register_counter, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("chat_requests_total", "Total number of chat requests").unwrap();
    pub static ref THROTTLED_TOTAL: Counter =
        register_counter!("chat_throttled_total", "Chat requests rejected by the rate limiter").unwrap();
    pub static ref UPSTREAM_FAILURES: Counter =
        register_counter!("chat_upstream_failures_total", "Failed completion calls").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "chat_request_latency_seconds",
        "Latency of accepted chat requests in seconds"
    )
    .unwrap();
}
