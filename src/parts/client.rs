//! Parts service client with timeout and outcome classification.
//!
//! # Responsibilities
//! - One `GET /api/parts/{id}` per lookup, bounded by the configured deadline
//! - Classify the answer: found, not found, malformed, or dependency failure
//! - No retries; the circuit breaker decides when to try again

use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, FutureExt};
use reqwest::StatusCode;
use url::Url;

use crate::config::PartsConfig;
use crate::observability::metrics;
use crate::parts::types::{
    DependencyFailure, PartLookup, PartRecord, PartsClientError,
};
use crate::resilience::timeouts::with_deadline;

/// Anything that can look up a part.
///
/// The order workflow depends on this rather than on HTTP so it can be driven
/// by other transports or by test doubles.
pub trait PartsSource: Send + Sync {
    fn fetch_part(&self, part_id: u64) -> BoxFuture<'_, Result<PartLookup, DependencyFailure>>;
}

/// HTTP client for the parts service.
#[derive(Clone)]
pub struct PartsClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl PartsClient {
    /// Create a new parts client.
    pub fn new(config: &PartsConfig) -> Result<Self, PartsClientError> {
        let base_url = Url::parse(&config.base_url)?;
        let timeout = config.timeout();
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .no_proxy()
            .build()?;

        tracing::info!(
            base_url = %base_url,
            timeout_ms = config.timeout_ms,
            "Parts client initialized"
        );

        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    /// Look up a part, giving up after the configured deadline.
    pub async fn lookup(&self, part_id: u64) -> Result<PartLookup, DependencyFailure> {
        let start = Instant::now();
        let result = match with_deadline(self.timeout, self.request(part_id)).await {
            Ok(result) => result,
            Err(_) => Err(DependencyFailure::Timeout(self.timeout)),
        };

        let outcome = match &result {
            Ok(PartLookup::Found(_)) => "found",
            Ok(PartLookup::NotFound) => "not_found",
            Ok(PartLookup::Malformed(_)) => "malformed",
            Err(failure) => failure.label(),
        };
        metrics::record_parts_lookup(outcome, start);

        match &result {
            Ok(PartLookup::Malformed(reason)) => {
                tracing::warn!(part_id, reason = %reason, "Parts service returned invalid data")
            }
            Err(failure) => tracing::warn!(part_id, error = %failure, "Parts service call failed"),
            Ok(_) => tracing::debug!(part_id, outcome, "Parts service answered"),
        }

        result
    }

    fn part_url(&self, part_id: u64) -> String {
        format!(
            "{}/api/parts/{}",
            self.base_url.as_str().trim_end_matches('/'),
            part_id
        )
    }

    async fn request(&self, part_id: u64) -> Result<PartLookup, DependencyFailure> {
        let response = self
            .http
            .get(self.part_url(part_id))
            .send()
            .await
            .map_err(|e| DependencyFailure::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(PartLookup::NotFound);
        }
        if !status.is_success() {
            return Err(DependencyFailure::UnexpectedStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DependencyFailure::Transport(e.to_string()))?;

        let lookup = match serde_json::from_slice::<PartRecord>(&body) {
            Ok(record) => match record.into_snapshot(part_id) {
                Ok(snapshot) => PartLookup::Found(snapshot),
                Err(reason) => PartLookup::Malformed(reason),
            },
            Err(e) => PartLookup::Malformed(format!("unparseable body: {e}")),
        };
        Ok(lookup)
    }
}

impl PartsSource for PartsClient {
    fn fetch_part(&self, part_id: u64) -> BoxFuture<'_, Result<PartLookup, DependencyFailure>> {
        self.lookup(part_id).boxed()
    }
}

impl std::fmt::Debug for PartsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartsClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_ms", &self.timeout.as_millis())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> PartsClient {
        PartsClient::new(&PartsConfig {
            base_url: base_url.to_string(),
            timeout_ms: 500,
        })
        .unwrap()
    }

    #[test]
    fn test_part_url_tolerates_trailing_slash() {
        assert_eq!(
            client("http://parts:8000/").part_url(3),
            "http://parts:8000/api/parts/3"
        );
        assert_eq!(
            client("http://parts:8000/inventory").part_url(3),
            "http://parts:8000/inventory/api/parts/3"
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let err = PartsClient::new(&PartsConfig {
            base_url: "not a url".to_string(),
            timeout_ms: 500,
        })
        .unwrap_err();
        assert!(matches!(err, PartsClientError::InvalidBaseUrl(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_dependency_failure() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = client(&format!("http://{addr}")).lookup(1).await;
        assert!(matches!(result, Err(DependencyFailure::Transport(_))));
    }
}
