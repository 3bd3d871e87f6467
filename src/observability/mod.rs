//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarding handlers produce:
//!     → logging.rs (structured log events, request spans)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows into every request span
//! - Metrics are cheap and no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
