//! Metrics collection and exposition.
//!
//! # Metrics
//! - `orders_http_requests_total` (counter): requests by method, route, status
//! - `orders_http_request_duration_seconds` (histogram): latency by method, route
//! - `parts_requests_total` (counter): parts lookups by outcome
//! - `parts_request_duration_seconds` (histogram): parts lookup latency
//! - `circuit_breaker_state` (gauge): 0=closed, 1=open, 2=half-open
//! - `circuit_breaker_transitions_total` (counter): transitions by target state
//! - `circuit_breaker_short_circuits_total` (counter): calls refused
//! - `orders_created_total` / `orders_rejected_total` (counters)
//!
//! Without an installed recorder every call here is a no-op, so library code
//! and tests can record freely.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::circuit_breaker::BreakerState;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

/// Record a completed inbound HTTP request.
pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let duration = start.elapsed().as_secs_f64();
    metrics::counter!(
        "orders_http_requests_total",
        "method" => method.to_string(),
        "path" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "orders_http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => route.to_string()
    )
    .record(duration);
}

/// Record one parts service lookup.
pub fn record_parts_lookup(outcome: &'static str, start: Instant) {
    metrics::counter!("parts_requests_total", "outcome" => outcome).increment(1);
    metrics::histogram!("parts_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Set the breaker state gauge without counting a transition.
pub fn set_breaker_state(breaker: &str, state: BreakerState) {
    let value = match state {
        BreakerState::Closed => 0.0,
        BreakerState::Open => 1.0,
        BreakerState::HalfOpen => 2.0,
    };
    metrics::gauge!("circuit_breaker_state", "breaker" => breaker.to_string()).set(value);
}

/// Record a breaker entering `state`.
pub fn record_breaker_transition(breaker: &str, state: BreakerState) {
    set_breaker_state(breaker, state);
    metrics::counter!(
        "circuit_breaker_transitions_total",
        "breaker" => breaker.to_string(),
        "to" => state.as_str()
    )
    .increment(1);
}

/// Record a call refused by an open breaker.
pub fn record_short_circuit(breaker: &str) {
    metrics::counter!("circuit_breaker_short_circuits_total", "breaker" => breaker.to_string())
        .increment(1);
}

pub fn record_order_created() {
    metrics::counter!("orders_created_total").increment(1);
}

pub fn record_order_rejected(reason: &'static str) {
    metrics::counter!("orders_rejected_total", "reason" => reason).increment(1);
}

/// Middleware recording request count and latency per matched route.
///
/// Install with `route_layer` so the matched path template is available.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(request).await;
    record_request(&method, &route, response.status().as_u16(), start);
    response
}
