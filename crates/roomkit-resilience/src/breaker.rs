use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::ResilienceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: State,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    /// `true` while a half-open probe is in flight, so concurrent callers
    /// don't all get admitted as "the" probe.
    probe_in_flight: bool,
}

/// Per-channel failure isolation: `closed -> open` after `failure_threshold`
/// consecutive failures, `open` rejects everything for `recovery_time`, then
/// exactly one `half_open` probe decides whether to close again or reopen.
pub struct CircuitBreaker {
    failure_threshold: u32,
    recovery_time: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, recovery_time: Duration) -> Self {
        Self {
            failure_threshold,
            recovery_time,
            inner: Mutex::new(Inner {
                state: State::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probe_in_flight: false,
            }),
        }
    }

    #[cfg(test)]
    fn is_open(&self) -> bool {
        self.inner.lock().expect("breaker lock poisoned").state == State::Open
    }

    fn admit(&self) -> Result<bool, ()> {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        match inner.state {
            State::Closed => Ok(false),
            State::Open => {
                let elapsed = inner.opened_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed >= self.recovery_time && !inner.probe_in_flight {
                    inner.state = State::HalfOpen;
                    inner.probe_in_flight = true;
                    Ok(true)
                } else {
                    Err(())
                }
            }
            State::HalfOpen => {
                if inner.probe_in_flight {
                    Err(())
                } else {
                    inner.probe_in_flight = true;
                    Ok(true)
                }
            }
        }
    }

    fn record_success(&self, was_probe: bool) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        inner.state = State::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        if was_probe {
            inner.probe_in_flight = false;
        }
    }

    fn record_failure(&self, was_probe: bool) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        if was_probe {
            inner.probe_in_flight = false;
            inner.state = State::Open;
            inner.opened_at = Some(Instant::now());
            return;
        }
        inner.consecutive_failures += 1;
        if inner.consecutive_failures >= self.failure_threshold {
            inner.state = State::Open;
            inner.opened_at = Some(Instant::now());
        }
    }

    /// Runs `fut` if the breaker admits the call, recording the result into
    /// the state machine. Rejects immediately (no call into `fut`) while
    /// `open`.
    pub async fn run<F, Fut, T, E>(&self, fut: F) -> Result<T, ResilienceError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + 'static,
    {
        let was_probe = match self.admit() {
            Ok(probe) => probe,
            Err(()) => return Err(ResilienceError::CircuitOpen),
        };

        match fut().await {
            Ok(value) => {
                self.record_success(was_probe);
                Ok(value)
            }
            Err(e) => {
                self.record_failure(was_probe);
                Err(ResilienceError::Inner(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("boom")]
    struct Boom;

    #[tokio::test]
    async fn opens_after_consecutive_failures() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            let _ = breaker.run(|| async { Err::<(), Boom>(Boom) }).await;
        }
        assert!(breaker.is_open());
        let result = breaker.run(|| async { Ok::<(), Boom>(()) }).await;
        assert!(matches!(result, Err(ResilienceError::CircuitOpen)));
    }

    #[tokio::test]
    async fn success_resets_failure_counter_while_closed() {
        let breaker = CircuitBreaker::new(2, Duration::from_secs(60));
        let _ = breaker.run(|| async { Err::<(), Boom>(Boom) }).await;
        let _ = breaker.run(|| async { Ok::<(), Boom>(()) }).await;
        let _ = breaker.run(|| async { Err::<(), Boom>(Boom) }).await;
        assert!(!breaker.is_open());
    }

    #[tokio::test]
    async fn half_open_probe_success_closes_the_breaker() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(10));
        let _ = breaker.run(|| async { Err::<(), Boom>(Boom) }).await;
        assert!(breaker.is_open());
        tokio::time::sleep(Duration::from_millis(20)).await;
        let result = breaker.run(|| async { Ok::<(), Boom>(()) }).await;
        assert!(result.is_ok());
        assert!(!breaker.is_open());
    }

    #[tokio::test]
    async fn half_open_probe_failure_reopens_the_breaker() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(10));
        let _ = breaker.run(|| async { Err::<(), Boom>(Boom) }).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        let result = breaker.run(|| async { Err::<(), Boom>(Boom) }).await;
        assert!(matches!(result, Err(ResilienceError::Inner(_))));
        assert!(breaker.is_open());
    }
}
