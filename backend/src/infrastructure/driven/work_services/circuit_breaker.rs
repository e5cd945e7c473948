//! Per-upstream circuit breaker for fast-failing count lookups.
//!
//! ```text
//! ┌────────┐ N failures in window ┌──────┐  cooldown  ┌───────────┐
//! │ Closed ├─────────────────────►│ Open ├───────────►│ Half-Open │
//! └────▲───┘                      └──▲───┘            └─────┬─────┘
//!      │                             │   trial failure      │
//!      │                             └──────────────────────┤
//!      │          M trial successes                         │
//!      └────────────────────────────────────────────────────┘
//! ```
//!
//! While open, calls are rejected before any network I/O. Half-open admits
//! at most M concurrent trial calls.

use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// A failure streak older than this starts over.
    pub window: Duration,
    /// How long the circuit stays open before probing.
    pub open_cooldown: Duration,
    /// Trial successes needed to close; also the cap on concurrent trial calls.
    pub half_open_successes: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            window: Duration::from_secs(60),
            open_cooldown: Duration::from_secs(30),
            half_open_successes: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half-open"),
        }
    }
}

#[derive(Debug)]
struct Circuit {
    state: CircuitState,
    consecutive_failures: u32,
    streak_started: Option<Instant>,
    opened_at: Option<Instant>,
    trial_successes: u32,
    trials_in_flight: u32,
    /// Bumped on every transition; outcomes of calls admitted in an earlier
    /// epoch are ignored.
    epoch: u64,
}

impl Circuit {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            streak_started: None,
            opened_at: None,
            trial_successes: 0,
            trials_in_flight: 0,
            epoch: 0,
        }
    }
}

/// Breaker guarding a single upstream. Safe to share between tasks.
#[derive(Debug)]
pub struct CircuitBreaker {
    upstream: &'static str,
    config: CircuitBreakerConfig,
    circuit: Mutex<Circuit>,
}

/// Admission to make one call. Report the outcome with [`CallPermit::succeeded`]
/// or [`CallPermit::failed`]; dropping it unreported (e.g. on cancellation)
/// only releases the trial slot.
#[must_use]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    epoch: u64,
    settled: bool,
}

impl CallPermit<'_> {
    pub fn succeeded(mut self) {
        self.settled = true;
        self.breaker.record_success(self.trial, self.epoch);
    }

    pub fn failed(mut self) {
        self.settled = true;
        self.breaker.record_failure(self.trial, self.epoch);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.trial {
            let mut circuit = self.breaker.circuit.lock();
            if circuit.epoch == self.epoch {
                circuit.trials_in_flight = circuit.trials_in_flight.saturating_sub(1);
            }
        }
    }
}

impl CircuitBreaker {
    pub fn new(upstream: &'static str, config: CircuitBreakerConfig) -> Self {
        Self {
            upstream,
            config,
            circuit: Mutex::new(Circuit::new()),
        }
    }

    /// Admits a call, or returns how long until the circuit admit a trial call again.
    pub fn try_acquire(&self) -> Result<CallPermit<'_>, Duration> {
        let mut circuit = self.circuit.lock();
        self.refresh(&mut circuit);

        match circuit.state {
            CircuitState::Closed => Ok(self.permit(&circuit, false)),
            CircuitState::HalfOpen if circuit.trials_in_flight < self.config.half_open_successes => {
                circuit.trials_in_flight += 1;
                Ok(self.permit(&circuit, true))
            }
            CircuitState::HalfOpen => Err(Duration::ZERO),
            CircuitState::Open => Err(circuit
                .opened_at
                .map(|t| self.config.open_cooldown.saturating_sub(t.elapsed()))
                .unwrap_or(self.config.open_cooldown)),
        }
    }

    fn permit(&self, circuit: &Circuit, trial: bool) -> CallPermit<'_> {
        CallPermit { breaker: self, trial, epoch: circuit.epoch, settled: false }
    }

    pub fn state(&self) -> CircuitState {
        let mut circuit = self.circuit.lock();
        self.refresh(&mut circuit);
        circuit.state
    }

    fn refresh(&self, circuit: &mut Circuit) {
        if circuit.state == CircuitState::Open
            && circuit.opened_at.is_some_and(|t| t.elapsed() >= self.config.open_cooldown)
        {
            self.transition(circuit, CircuitState::HalfOpen, "cooldown elapsed, allowing trial calls");
            circuit.trial_successes = 0;
            circuit.trials_in_flight = 0;
        }
    }

    fn record_success(&self, trial: bool, epoch: u64) {
        let mut circuit = self.circuit.lock();
        // a call admitted before the last transition says nothing about the current state
        if circuit.epoch != epoch {
            return;
        }
        if trial {
            circuit.trials_in_flight = circuit.trials_in_flight.saturating_sub(1);
        }

        match circuit.state {
            CircuitState::Closed => {
                circuit.consecutive_failures = 0;
                circuit.streak_started = None;
            }
            CircuitState::HalfOpen if trial => {
                circuit.trial_successes += 1;
                if circuit.trial_successes >= self.config.half_open_successes {
                    self.transition(&mut circuit, CircuitState::Closed, "recovery confirmed");
                    circuit.consecutive_failures = 0;
                    circuit.streak_started = None;
                    circuit.opened_at = None;
                    circuit.trial_successes = 0;
                    circuit.trials_in_flight = 0;
                }
            }
            CircuitState::HalfOpen | CircuitState::Open => {}
        }
    }

    fn record_failure(&self, trial: bool, epoch: u64) {
        let mut circuit = self.circuit.lock();
        if circuit.epoch != epoch {
            return;
        }
        if trial {
            circuit.trials_in_flight = circuit.trials_in_flight.saturating_sub(1);
        }

        match circuit.state {
            CircuitState::Closed => {
                let now = Instant::now();
                let streak_expired = circuit
                    .streak_started
                    .map_or(true, |started| now.duration_since(started) > self.config.window);
                if streak_expired {
                    circuit.streak_started = Some(now);
                    circuit.consecutive_failures = 0;
                }
                circuit.consecutive_failures += 1;

                if circuit.consecutive_failures >= self.config.failure_threshold {
                    self.transition(&mut circuit, CircuitState::Open, "failure threshold reached");
                    circuit.opened_at = Some(now);
                }
            }
            CircuitState::HalfOpen if trial => {
                self.transition(&mut circuit, CircuitState::Open, "trial call failed, reopening");
                circuit.opened_at = Some(Instant::now());
                circuit.trial_successes = 0;
            }
            CircuitState::HalfOpen | CircuitState::Open => {}
        }
    }

    fn transition(&self, circuit: &mut Circuit, to: CircuitState, reason: &'static str) {
        tracing::warn!(
            upstream = self.upstream,
            from = %circuit.state,
            to = %to,
            consecutive_failures = circuit.consecutive_failures,
            "circuit breaker state transition: {reason}"
        );
        circuit.state = to;
        circuit.epoch += 1;
    }
}
