//! Header sanitization for the upstream leg.
//!
//! Connection-specific headers are recomputed by the outbound transport;
//! forwarding stale values breaks length framing, connection reuse and
//! encoding negotiation.

use axum::http::{header, HeaderMap, HeaderName};

/// Headers removed from every forwarded request.
pub const STRIPPED_HEADERS: [HeaderName; 4] = [
    header::HOST,
    header::CONTENT_LENGTH,
    header::CONNECTION,
    header::ACCEPT_ENCODING,
];

/// Copy the inbound header set minus [`STRIPPED_HEADERS`].
///
/// Multi-valued headers keep every value in their original order.
pub fn sanitize_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = inbound.clone();
    for name in &STRIPPED_HEADERS {
        headers.remove(name);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_strips_transport_headers() {
        let mut inbound = HeaderMap::new();
        inbound.insert("Host", HeaderValue::from_static("localhost:3000"));
        inbound.insert("Content-Length", HeaderValue::from_static("12"));
        inbound.insert("Connection", HeaderValue::from_static("keep-alive"));
        inbound.insert("Accept-Encoding", HeaderValue::from_static("gzip, br"));
        inbound.insert("Authorization", HeaderValue::from_static("Bearer token"));
        inbound.insert("X-Course-Id", HeaderValue::from_static("42"));

        let outbound = sanitize_headers(&inbound);

        for name in &STRIPPED_HEADERS {
            assert!(!outbound.contains_key(name), "{} should be stripped", name);
        }
        assert_eq!(outbound.len(), 2);
        assert_eq!(outbound["authorization"], "Bearer token");
        assert_eq!(outbound["x-course-id"], "42");
    }

    #[test]
    fn test_keeps_repeated_values() {
        let mut inbound = HeaderMap::new();
        inbound.append("cookie", HeaderValue::from_static("session=abc"));
        inbound.append("cookie", HeaderValue::from_static("cart=1"));

        let outbound = sanitize_headers(&inbound);
        let cookies: Vec<_> = outbound.get_all("cookie").iter().collect();
        assert_eq!(cookies, vec!["session=abc", "cart=1"]);
    }
}
