use axum::http::HeaderMap;

pub const FORWARDED_FOR: &str = "x-forwarded-for";

// Used when no forwarding header is present
pub const FALLBACK_IP: &str = "127.0.0.1";

/// Caller identity: the left-most `X-Forwarded-For` address, or [`FALLBACK_IP`].
pub fn caller_ip(headers: &HeaderMap) -> String {
    headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(FALLBACK_IP)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_header_falls_back() {
        assert_eq!(caller_ip(&HeaderMap::new()), FALLBACK_IP);
    }

    #[test]
    fn takes_leftmost_forwarded_address() {
        let mut headers = HeaderMap::new();
        headers.insert(
            FORWARDED_FOR,
            HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"),
        );
        assert_eq!(caller_ip(&headers), "203.0.113.7");
    }

    #[test]
    fn empty_header_falls_back() {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_static(""));
        assert_eq!(caller_ip(&headers), FALLBACK_IP);
    }
}
