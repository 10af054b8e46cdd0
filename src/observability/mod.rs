//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, gauges, histograms via `metrics`)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Prometheus scrape endpoint
//! ```
//!
//! # Design Decisions
//! - Request ID (x-request-id) flows through handler logs
//! - Breaker transitions are both logged and exported as gauges

pub mod logging;
pub mod metrics;
