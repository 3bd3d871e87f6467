//! Forwarding proxy for the course platform backend.
//!
//! Requests under a local prefix are re-issued against a fixed upstream
//! origin with the same method, a sanitized header set and a body re-encoded
//! for its content type. Upstream responses stream back unchanged.

pub mod config;
pub mod error;
pub mod forward;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::ForwarderConfig;
pub use error::ForwardError;
pub use forward::RequestForwarder;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
