//! Request forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request under the local prefix
//!     → headers.rs (copy, strip transport headers)
//!     → body.rs (detect kind from content-type, decode, re-encode)
//!     → forwarder.rs (build target URL, call upstream, no redirects)
//!     → http::response (stream upstream response back verbatim)
//! ```
//!
//! # Design Decisions
//! - The inbound body is fully read before the upstream call; the response
//!   body is streamed back without buffering
//! - GET and HEAD never touch the inbound body
//! - No retries: every call may have side effects upstream

pub mod body;
pub mod forwarder;
pub mod headers;

pub use body::{BodyKind, FieldValue, InboundBody, MultipartField, OutboundBody};
pub use forwarder::RequestForwarder;
pub use headers::{sanitize_headers, STRIPPED_HEADERS};
