//! Response handling.
//!
//! # Responsibilities
//! - Turn the upstream response into the client response
//! - Map forwarding errors to HTTP status codes
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Status and headers are copied verbatim, 3xx included
//! - Upstream timeouts result in 504 Gateway Timeout, other failures in 502

use axum::body::Body;
use axum::response::{IntoResponse, Response};

use crate::error::ForwardError;

/// Stream an upstream response back to the caller unchanged.
pub fn passthrough(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let headers = upstream.headers().clone();

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ForwardError::MalformedBody { .. } | ForwardError::BodyRead(_) => self.to_string(),
            ForwardError::InvalidTarget(_) => "Invalid upstream path".to_string(),
            ForwardError::Timeout(_) => "Upstream request timed out".to_string(),
            ForwardError::Network(_) => "Upstream request failed".to_string(),
        };
        (status, message).into_response()
    }
}
