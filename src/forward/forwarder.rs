//! The request forwarder.
//!
//! # Responsibilities
//! - Build the upstream URL from the fixed origin and captured segments
//! - Decode and re-encode the inbound body per its content type
//! - Issue the upstream call with redirects disabled
//! - Hand the upstream response back for streaming passthrough

use std::time::Duration;

use axum::extract::Request;
use axum::response::Response;
use reqwest::{redirect, Client};

use crate::config::ForwarderConfig;
use crate::error::ForwardError;
use crate::forward::body::{BodyKind, InboundBody};
use crate::forward::headers::sanitize_headers;
use crate::http::response::passthrough;

/// Forwards requests to a single upstream origin.
///
/// Holds no per-request state; one instance is shared by all handlers.
#[derive(Debug, Clone)]
pub struct RequestForwarder {
    client: Client,
    origin: String,
    preserve_query: bool,
    max_body_size: usize,
}

impl RequestForwarder {
    /// Build a forwarder from validated configuration.
    pub fn new(config: &ForwarderConfig) -> Result<Self, reqwest::Error> {
        // The origin is fixed; environment proxy settings do not apply to it.
        let mut builder = Client::builder()
            .redirect(redirect::Policy::none())
            .no_proxy();
        if let Some(secs) = config.timeouts.connect_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = config.timeouts.upstream_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            origin: config.upstream.origin.trim_end_matches('/').to_string(),
            preserve_query: config.upstream.preserve_query,
            max_body_size: config.limits.max_body_size,
        })
    }

    /// The origin every request is forwarded to.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Join the origin with the captured path segments.
    ///
    /// An empty segment list resolves to the bare origin.
    pub fn target_url(&self, segments: &[String], query: Option<&str>) -> String {
        let mut url = format!("{}/{}", self.origin, segments.join("/"));
        if let Some(query) = query.filter(|q| self.preserve_query && !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        url
    }

    /// Forward `request` upstream and return the upstream response.
    ///
    /// The inbound body is decoded before anything is sent, so a malformed
    /// body never reaches the upstream.
    pub async fn forward(&self, request: Request, segments: &[String]) -> Result<Response, ForwardError> {
        let method = request.method().clone();
        let kind = BodyKind::detect(&method, request.headers());
        let url = self.target_url(segments, request.uri().query());
        let mut headers = sanitize_headers(request.headers());

        let body = InboundBody::read(kind, request, self.max_body_size).await?;
        let outbound = body.encode(&mut headers)?;

        tracing::debug!(
            method = %method,
            url = %url,
            body = %kind,
            "Forwarding request upstream"
        );

        let builder = self.client.request(method, &url).headers(headers);
        let upstream = outbound.apply(builder).send().await?;

        tracing::debug!(
            url = %url,
            status = %upstream.status(),
            "Upstream responded"
        );

        Ok(passthrough(upstream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forwarder(origin: &str, preserve_query: bool) -> RequestForwarder {
        let mut config = ForwarderConfig::default();
        config.upstream.origin = origin.to_string();
        config.upstream.preserve_query = preserve_query;
        RequestForwarder::new(&config).unwrap()
    }

    fn segments(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_target_url_joins_segments() {
        let f = forwarder("http://backend:8000", false);
        assert_eq!(
            f.target_url(&segments(&["courses", "42", "materials"]), None),
            "http://backend:8000/courses/42/materials"
        );
    }

    #[test]
    fn test_target_url_empty_segments_is_bare_origin() {
        let f = forwarder("http://backend:8000/", false);
        assert_eq!(f.origin(), "http://backend:8000");
        assert_eq!(f.target_url(&[], None), "http://backend:8000/");
    }

    #[test]
    fn test_target_url_query_is_opt_in() {
        let dropped = forwarder("https://api.example.com", false);
        assert_eq!(
            dropped.target_url(&segments(&["orders"]), Some("status=pending")),
            "https://api.example.com/orders"
        );

        let kept = forwarder("https://api.example.com", true);
        assert_eq!(
            kept.target_url(&segments(&["orders"]), Some("status=pending")),
            "https://api.example.com/orders?status=pending"
        );
        assert_eq!(
            kept.target_url(&segments(&["orders"]), Some("")),
            "https://api.example.com/orders"
        );
    }
}
