//! Errors raised while forwarding a request upstream.
//!
//! Upstream responses with non-2xx statuses are never errors here; they are
//! passed through to the caller like any other response.

use std::fmt::Display;

use axum::http::StatusCode;
use thiserror::Error;

use crate::forward::BodyKind;

/// Failure modes of a single forwarded exchange.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The inbound body does not match its declared content type.
    #[error("malformed {kind} body: {reason}")]
    MalformedBody { kind: BodyKind, reason: String },

    /// The inbound body could not be read off the connection.
    #[error("failed to read request body: {0}")]
    BodyRead(#[source] axum::Error),

    /// The captured path segments do not form a valid upstream URL.
    #[error("invalid upstream target: {0}")]
    InvalidTarget(#[source] reqwest::Error),

    /// The upstream call exceeded a configured timeout.
    #[error("upstream request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// DNS, connect or transfer failure on the upstream leg.
    #[error("upstream request failed: {0}")]
    Network(#[source] reqwest::Error),
}

impl ForwardError {
    pub(crate) fn malformed(kind: BodyKind, reason: impl Display) -> Self {
        ForwardError::MalformedBody {
            kind,
            reason: reason.to_string(),
        }
    }

    /// Status code reported to the original caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::MalformedBody { .. }
            | ForwardError::BodyRead(_)
            | ForwardError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
            ForwardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ForwardError::Network(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// True when the caller sent something we refused to forward.
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

impl From<reqwest::Error> for ForwardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ForwardError::InvalidTarget(err)
        } else if err.is_timeout() {
            ForwardError::Timeout(err)
        } else {
            ForwardError::Network(err)
        }
    }
}
