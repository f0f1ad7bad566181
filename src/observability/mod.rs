//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Routing and transport produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the transport's trace spans
//! - Metrics are cheap (no-ops until a recorder is installed)

pub mod logging;
pub mod metrics;
