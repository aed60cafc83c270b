//! `roomkit-resilience` — per-channel circuit breaker, token-bucket rate
//! limiter, and exponential-backoff retry.

pub mod breaker;
pub mod error;
pub mod rate_limiter;
pub mod registry;
pub mod retry;

pub use breaker::CircuitBreaker;
pub use error::ResilienceError;
pub use rate_limiter::RateLimiter;
pub use registry::{ChannelResilience, ResilienceDefaults, ResilienceRegistry};
pub use retry::{retry_with_backoff, RetryPolicy};
