use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Circuit state for upstream provider calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Breaker thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// How long an open circuit rejects calls before allowing a probe.
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Default)]
struct CircuitInner {
    failures: u32,
    open_until: Option<Instant>,
    probing: bool,
}

/// Thread-safe circuit breaker guarding the provider adapter.
///
/// After `failure_threshold` consecutive failures the circuit opens and the
/// adapter fails fast for `cooldown`; the first call after the cooldown is a
/// half-open probe whose outcome closes or re-opens the circuit.
#[derive(Debug, Default)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<CircuitInner>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(CircuitInner::default()),
        }
    }

    pub fn allow_request(&self) -> bool {
        let mut inner = self
            .inner
            .lock()
            .expect("circuit breaker lock is not poisoned");
        match inner.open_until {
            None => true,
            Some(open_until) if Instant::now() >= open_until => {
                inner.open_until = None;
                inner.probing = true;
                true
            }
            Some(_) => false,
        }
    }

    pub fn record_success(&self) {
        let mut inner = self
            .inner
            .lock()
            .expect("circuit breaker lock is not poisoned");
        inner.failures = 0;
        inner.open_until = None;
        inner.probing = false;
    }

    pub fn record_failure(&self) {
        let mut inner = self
            .inner
            .lock()
            .expect("circuit breaker lock is not poisoned");
        inner.failures = inner.failures.saturating_add(1);

        if inner.probing || inner.failures >= self.config.failure_threshold {
            inner.open_until = Some(Instant::now() + self.config.cooldown);
            inner.probing = false;
        }
    }

    pub fn state(&self) -> CircuitState {
        let inner = self
            .inner
            .lock()
            .expect("circuit breaker lock is not poisoned");
        if inner.probing {
            CircuitState::HalfOpen
        } else if inner.open_until.is_some() {
            CircuitState::Open
        } else {
            CircuitState::Closed
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.inner
            .lock()
            .expect("circuit breaker lock is not poisoned")
            .failures
    }
}
