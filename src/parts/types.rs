//! Parts service types and error definitions.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Stock and price of a part as reported by the parts service at call time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartSnapshot {
    pub part_id: u64,
    pub stock: u64,
    pub unit_price: Decimal,
}

/// An answer from the parts service.
///
/// All three variants mean the dependency responded; none of them count
/// against the circuit breaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartLookup {
    /// The part exists and the record was complete.
    Found(PartSnapshot),
    /// The parts service says the part does not exist.
    NotFound,
    /// A success response whose payload broke the contract.
    Malformed(String),
}

/// The parts service could not be reached or answered abnormally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyFailure {
    /// No complete response within the deadline.
    #[error("parts service timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Connection refused, reset, DNS failure, truncated body, ...
    #[error("parts service transport error: {0}")]
    Transport(String),

    /// Any status other than 2xx or 404.
    #[error("parts service returned unexpected status {0}")]
    UnexpectedStatus(u16),
}

impl DependencyFailure {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            DependencyFailure::Timeout(_) => "timeout",
            DependencyFailure::Transport(_) => "transport",
            DependencyFailure::UnexpectedStatus(_) => "unexpected_status",
        }
    }
}

/// Errors building a parts client.
#[derive(Debug, Error)]
pub enum PartsClientError {
    #[error("invalid parts service URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Wire shape of a part record. Only the fields the order flow needs.
#[derive(Debug, Deserialize)]
pub(crate) struct PartRecord {
    stock: Option<i64>,
    price: Option<Decimal>,
}

impl PartRecord {
    /// Check the record and turn it into a snapshot, or describe what is wrong.
    pub(crate) fn into_snapshot(self, part_id: u64) -> Result<PartSnapshot, String> {
        let stock = match self.stock {
            None => return Err("missing stock".to_string()),
            Some(s) if s < 0 => return Err(format!("negative stock {s}")),
            Some(s) => s as u64,
        };
        let unit_price = match self.price {
            None => return Err("missing price".to_string()),
            Some(p) if p.is_sign_negative() && !p.is_zero() => {
                return Err(format!("negative price {p}"))
            }
            Some(p) => p,
        };
        Ok(PartSnapshot {
            part_id,
            stock,
            unit_price,
        })
    }
}
