//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, prefix routes, middleware)
//!     → request.rs (request ID generation and propagation)
//!     → forward::RequestForwarder (upstream call)
//!     → response.rs (stream upstream response, map errors)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id, RequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
