//! Parts service integration.
//!
//! # Data Flow
//! ```text
//! part id
//!     → client.rs (GET /api/parts/{id} with deadline)
//!     → types.rs (record validation into PartSnapshot)
//!     → PartLookup | DependencyFailure
//! ```
//!
//! # Design Decisions
//! - 404 is an answer, not a failure; it never trips the breaker
//! - A 2xx with an incomplete record is a contract violation, not a failure
//! - Timeouts, transport errors and other statuses are failures

pub mod client;
pub mod types;

pub use client::{PartsClient, PartsSource};
pub use types::{DependencyFailure, PartLookup, PartSnapshot, PartsClientError};
