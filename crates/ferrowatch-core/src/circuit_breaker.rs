use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{info, warn};

/// Externally visible circuit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Failure threshold and cool-down for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub open_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            open_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Closed { failures: u32 },
    Open { since: Instant },
    /// A single probe is in flight. Another is admitted only if it has not
    /// reported back within the cool-down, e.g. because its call was dropped.
    HalfOpen { probe_started: Instant },
}

/// Thread-safe circuit breaker guarding one upstream provider.
///
/// While open, adapters fail fast with an unavailable error instead of
/// spending the per-call timeout on a provider that is known to be down.
#[derive(Debug)]
pub struct CircuitBreaker {
    label: &'static str,
    config: CircuitBreakerConfig,
    phase: Mutex<Phase>,
}

impl CircuitBreaker {
    pub fn new(label: &'static str, config: CircuitBreakerConfig) -> Self {
        Self {
            label,
            config,
            phase: Mutex::new(Phase::Closed { failures: 0 }),
        }
    }

    fn phase(&self) -> MutexGuard<'_, Phase> {
        // Phase is Copy and replaced whole, so a poisoned lock still holds a valid value.
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cooled_down(&self, since: Instant) -> bool {
        since.elapsed() >= self.config.open_timeout
    }

    /// Whether a call may go upstream now. Once the cool-down has elapsed the
    /// first caller becomes the half-open probe; concurrent callers still fail fast.
    pub fn allow_request(&self) -> bool {
        let mut phase = self.phase();
        let current = *phase;
        match current {
            Phase::Closed { .. } => true,
            Phase::Open { since } if self.cooled_down(since) => {
                *phase = Phase::HalfOpen {
                    probe_started: Instant::now(),
                };
                info!(upstream = self.label, "circuit half-open, probing upstream");
                true
            }
            Phase::HalfOpen { probe_started } if self.cooled_down(probe_started) => {
                *phase = Phase::HalfOpen {
                    probe_started: Instant::now(),
                };
                true
            }
            Phase::Open { .. } | Phase::HalfOpen { .. } => false,
        }
    }

    pub fn record_success(&self) {
        let mut phase = self.phase();
        if !matches!(*phase, Phase::Closed { .. }) {
            info!(upstream = self.label, "circuit closed after successful call");
        }
        *phase = Phase::Closed { failures: 0 };
    }

    pub fn record_failure(&self) {
        let mut phase = self.phase();
        let current = *phase;
        let failures = match current {
            Phase::Closed { failures } => failures.saturating_add(1),
            Phase::HalfOpen { .. } => self.config.failure_threshold,
            Phase::Open { .. } => return,
        };

        if failures < self.config.failure_threshold {
            *phase = Phase::Closed { failures };
            return;
        }

        warn!(
            upstream = self.label,
            failures,
            open_for_secs = self.config.open_timeout.as_secs(),
            "circuit opened"
        );
        *phase = Phase::Open {
            since: Instant::now(),
        };
    }

    /// Current state; an open circuit whose cool-down has passed reports
    /// `HalfOpen` because the next call will probe.
    pub fn state(&self) -> CircuitState {
        match *self.phase() {
            Phase::Closed { .. } => CircuitState::Closed,
            Phase::Open { since } if self.cooled_down(since) => CircuitState::HalfOpen,
            Phase::Open { .. } => CircuitState::Open,
            Phase::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }
}
