//! Circuit breaker for dependency protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: dependency assumed down, calls fail fast
//! - Half-Open: a single probe tests whether the dependency recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures >= threshold
//! Open → Half-Open: first call after the cooldown (becomes the probe)
//! Half-Open → Closed: probe succeeds
//! Half-Open → Open: probe fails (cooldown restarts)
//! ```
//!
//! # Design Decisions
//! - Admission is one critical section: mode check, cooldown check and probe
//!   claim cannot interleave between callers
//! - Fail fast in Open state (wrapped call is never invoked)
//! - Single probe in Half-Open; concurrent callers are short-circuited
//! - A cancelled probe releases its slot instead of wedging the breaker
//! - Clock is `tokio::time::Instant` so cooldowns follow the runtime clock

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::config::BreakerConfig;
use crate::observability::metrics;

/// Breaker mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerState {
    pub fn as_str(self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }
}

/// Outcome of a guarded call.
///
/// Short-circuiting is a variant rather than an error so callers have to
/// decide what it means for them.
#[derive(Debug, PartialEq, Eq)]
pub enum BreakerResult<T, E> {
    /// The call ran and succeeded.
    Completed(T),
    /// The call ran and failed; the failure was counted.
    Failed(E),
    /// The breaker refused to run the call.
    ShortCircuited,
}

/// Point-in-time view of a breaker, for health endpoints and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: BreakerState,
    pub consecutive_failures: u32,
    /// Milliseconds since the breaker last opened, while not closed.
    pub opened_ms_ago: Option<u64>,
}

#[derive(Debug)]
struct Circuit {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Normal,
    Probe,
}

/// A consecutive-failure circuit breaker.
///
/// Created once at startup and shared through `Arc`.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    failure_threshold: u32,
    cooldown: Duration,
    circuit: Mutex<Circuit>,
}

impl CircuitBreaker {
    /// Create a closed breaker.
    pub fn new(name: impl Into<String>, config: &BreakerConfig) -> Self {
        let name = name.into();
        metrics::set_breaker_state(&name, BreakerState::Closed);
        Self {
            name,
            failure_threshold: config.failure_threshold.max(1),
            cooldown: config.cooldown(),
            circuit: Mutex::new(Circuit {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probe_in_flight: false,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current mode.
    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let circuit = self.lock();
        BreakerSnapshot {
            name: self.name.clone(),
            state: circuit.state,
            consecutive_failures: circuit.consecutive_failures,
            opened_ms_ago: circuit
                .opened_at
                .map(|at| at.elapsed().as_millis() as u64),
        }
    }

    /// Run `call` under the breaker.
    ///
    /// `Ok` counts as a success and `Err` as a failure. When the breaker is
    /// open, or a half-open probe is already in flight, `call` is not invoked.
    pub async fn execute<F, Fut, T, E>(&self, call: F) -> BreakerResult<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(permit) = self.try_acquire() else {
            tracing::debug!(breaker = %self.name, "Call short-circuited");
            metrics::record_short_circuit(&self.name);
            return BreakerResult::ShortCircuited;
        };

        match call().await {
            Ok(value) => {
                permit.succeed();
                BreakerResult::Completed(value)
            }
            Err(error) => {
                permit.fail();
                BreakerResult::Failed(error)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Circuit> {
        // Every update leaves the record consistent, so a poisoned lock is still usable.
        self.circuit.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_acquire(&self) -> Option<Permit<'_>> {
        let mut circuit = self.lock();
        let admission = match circuit.state {
            BreakerState::Closed => Admission::Normal,
            BreakerState::Open => {
                let cooled_down = circuit
                    .opened_at
                    .map_or(true, |at| at.elapsed() >= self.cooldown);
                if !cooled_down {
                    return None;
                }
                self.transition(&mut circuit, BreakerState::HalfOpen);
                circuit.probe_in_flight = true;
                Admission::Probe
            }
            BreakerState::HalfOpen => {
                if circuit.probe_in_flight {
                    return None;
                }
                circuit.probe_in_flight = true;
                Admission::Probe
            }
        };
        Some(Permit {
            breaker: self,
            admission,
            settled: false,
        })
    }

    fn on_success(&self, admission: Admission) {
        let mut circuit = self.lock();
        match admission {
            Admission::Normal => {
                // Late successes from calls admitted before the breaker opened
                // do not close it; only a probe can.
                if circuit.state == BreakerState::Closed {
                    circuit.consecutive_failures = 0;
                }
            }
            Admission::Probe => {
                circuit.probe_in_flight = false;
                circuit.consecutive_failures = 0;
                circuit.opened_at = None;
                self.transition(&mut circuit, BreakerState::Closed);
            }
        }
    }

    fn on_failure(&self, admission: Admission) {
        let mut circuit = self.lock();
        match admission {
            Admission::Normal => {
                if circuit.state != BreakerState::Closed {
                    return;
                }
                circuit.consecutive_failures += 1;
                tracing::debug!(
                    breaker = %self.name,
                    failures = circuit.consecutive_failures,
                    threshold = self.failure_threshold,
                    "Call failed"
                );
                if circuit.consecutive_failures >= self.failure_threshold {
                    circuit.opened_at = Some(Instant::now());
                    self.transition(&mut circuit, BreakerState::Open);
                }
            }
            Admission::Probe => {
                circuit.probe_in_flight = false;
                circuit.consecutive_failures = circuit.consecutive_failures.saturating_add(1);
                circuit.opened_at = Some(Instant::now());
                self.transition(&mut circuit, BreakerState::Open);
            }
        }
    }

    fn release_probe(&self) {
        let mut circuit = self.lock();
        circuit.probe_in_flight = false;
        tracing::debug!(breaker = %self.name, "Probe abandoned before completing");
    }

    fn transition(&self, circuit: &mut Circuit, to: BreakerState) {
        let from = circuit.state;
        if from == to {
            return;
        }
        circuit.state = to;

        match to {
            BreakerState::Open => tracing::warn!(
                breaker = %self.name,
                from = from.as_str(),
                failures = circuit.consecutive_failures,
                cooldown_ms = self.cooldown.as_millis() as u64,
                "Circuit opened"
            ),
            BreakerState::HalfOpen => tracing::info!(
                breaker = %self.name,
                "Cooldown elapsed, probing dependency"
            ),
            BreakerState::Closed => tracing::info!(
                breaker = %self.name,
                "Probe succeeded, circuit closed"
            ),
        }
        metrics::record_breaker_transition(&self.name, to);
    }
}

/// Admission ticket for one call. Settles exactly once; a probe ticket
/// dropped unsettled hands the probe slot back.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    admission: Admission,
    settled: bool,
}

impl Permit<'_> {
    fn succeed(mut self) {
        self.settled = true;
        self.breaker.on_success(self.admission);
    }

    fn fail(mut self) {
        self.settled = true;
        self.breaker.on_failure(self.admission);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.admission == Admission::Probe {
            self.breaker.release_probe();
        }
    }
}
