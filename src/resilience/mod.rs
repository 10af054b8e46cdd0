//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to the parts service:
//!     → circuit_breaker.rs (admit, short-circuit, or probe)
//!     → timeouts.rs (enforce the per-call deadline)
//!     → outcome fed back to circuit_breaker.rs
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No per-call retries; the breaker cooldown is the only backoff
//! - Circuit breaker prevents cascading failures

pub mod circuit_breaker;
pub mod timeouts;

pub use circuit_breaker::{BreakerResult, BreakerSnapshot, BreakerState, CircuitBreaker};
pub use timeouts::{with_deadline, DeadlineExceeded};
