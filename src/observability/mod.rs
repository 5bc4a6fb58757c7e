//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request pipeline and gates produce:
//!     → logging.rs (structured log events, request ID on every request line)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, JSON lines)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metrics are cheap and off by default

pub mod logging;
pub mod metrics;
