use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Token-bucket limiter. `acquire()` suspends until a token is available —
/// it never drops the caller's request, only delays it.
pub struct RateLimiter {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// `max_per_period` tokens refill uniformly over `period`. Capacity is
    /// at least 1 even for sub-1 rates.
    pub fn new(max_per_period: u32, period: Duration) -> Self {
        let refill_per_sec = max_per_period as f64 / period.as_secs_f64();
        let capacity = (max_per_period as f64).max(1.0);
        Self {
            capacity,
            refill_per_sec,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn per_second(max_per_second: u32) -> Self {
        Self::new(max_per_second.max(1), Duration::from_secs(1))
    }

    pub fn per_minute(max_per_minute: u32) -> Self {
        Self::new(max_per_minute.max(1), Duration::from_secs(60))
    }

    pub fn per_hour(max_per_hour: u32) -> Self {
        Self::new(max_per_hour.max(1), Duration::from_secs(3600))
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        state.last_refill = now;
    }

    /// Waits until a token is available, then consumes it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().expect("rate limiter lock poisoned");
                self.refill(&mut state);
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    None
                } else {
                    let deficit = 1.0 - state.tokens;
                    Some(Duration::from_secs_f64(deficit / self.refill_per_sec))
                }
            };
            match wait {
                None => return,
                Some(d) => tokio::time::sleep(d.max(Duration::from_millis(1))).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn admits_up_to_capacity_immediately() {
        let limiter = RateLimiter::per_second(3);
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn blocks_once_capacity_is_exhausted() {
        let limiter = RateLimiter::new(2, Duration::from_millis(200));
        limiter.acquire().await;
        limiter.acquire().await;
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
