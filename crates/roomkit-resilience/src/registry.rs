use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use roomkit_core::ChannelId;
use roomkit_store::{RateLimitConfig, RetryPolicyConfig};

use crate::breaker::CircuitBreaker;
use crate::rate_limiter::RateLimiter;
use crate::retry::RetryPolicy;

/// Defaults applied to a channel binding that declares no overrides of its
/// own.
#[derive(Debug, Clone)]
pub struct ResilienceDefaults {
    pub failure_threshold: u32,
    pub recovery_time: Duration,
    pub retry: RetryPolicy,
    /// Rate-limit tier applied when a binding declares no `rate_limit` of
    /// its own. `None` leaves such bindings unlimited.
    pub default_rate_limit: Option<RateLimitConfig>,
}

/// The breaker/limiter/retry trio for one `channel_id`.
pub struct ChannelResilience {
    pub breaker: CircuitBreaker,
    pub rate_limiter: Option<RateLimiter>,
    pub retry: RetryPolicy,
}

/// One [`ChannelResilience`] per `channel_id`, created lazily on first use
/// and held for the registry's lifetime — this state is mutated
/// only by the event router and assumes its own internal synchronization.
pub struct ResilienceRegistry {
    defaults: ResilienceDefaults,
    entries: DashMap<ChannelId, Arc<ChannelResilience>>,
}

impl ResilienceRegistry {
    pub fn new(defaults: ResilienceDefaults) -> Self {
        Self {
            defaults,
            entries: DashMap::new(),
        }
    }

    /// Returns the entry for `channel_id`, building it from `rate_limit` /
    /// `retry_policy` (the binding's own overrides, if any) the first time
    /// this channel is seen. Subsequent calls ignore the config arguments —
    /// a channel's resilience state does not get rebuilt mid-flight.
    pub fn get_or_init(
        &self,
        channel_id: &ChannelId,
        rate_limit: Option<&RateLimitConfig>,
        retry_policy: Option<&RetryPolicyConfig>,
    ) -> Arc<ChannelResilience> {
        let defaults = self.defaults.clone();
        self.entries
            .entry(channel_id.clone())
            .or_insert_with(|| {
                let rate_limiter = rate_limit
                    .or(defaults.default_rate_limit.as_ref())
                    .map(Self::build_rate_limiter);
                let retry = retry_policy
                    .map(|p| RetryPolicy {
                        max_retries: p.max_retries,
                        base_delay: Duration::from_millis(p.base_delay_ms),
                        max_delay: Duration::from_millis(p.max_delay_ms),
                        exponential_base: p.exponential_base,
                    })
                    .unwrap_or(defaults.retry);
                Arc::new(ChannelResilience {
                    breaker: CircuitBreaker::new(defaults.failure_threshold, defaults.recovery_time),
                    rate_limiter,
                    retry,
                })
            })
            .clone()
    }

    fn build_rate_limiter(cfg: &RateLimitConfig) -> RateLimiter {
        if let Some(per_second) = cfg.max_per_second {
            RateLimiter::per_second(per_second)
        } else if let Some(per_minute) = cfg.max_per_minute {
            RateLimiter::per_minute(per_minute)
        } else {
            RateLimiter::per_hour(cfg.max_per_hour.unwrap_or(3600))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> ResilienceDefaults {
        ResilienceDefaults {
            failure_threshold: 5,
            recovery_time: Duration::from_secs(60),
            retry: RetryPolicy {
                max_retries: 3,
                base_delay: Duration::from_millis(500),
                max_delay: Duration::from_secs(30),
                exponential_base: 2.0,
            },
            default_rate_limit: None,
        }
    }

    #[test]
    fn the_same_channel_id_returns_the_same_entry() {
        let registry = ResilienceRegistry::new(defaults());
        let channel_id = ChannelId::new("sms:+1");
        let a = registry.get_or_init(&channel_id, None, None);
        let b = registry.get_or_init(&channel_id, None, None);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn a_binding_with_no_override_falls_back_to_the_default_rate_limit_tier() {
        let mut with_default = defaults();
        with_default.default_rate_limit = Some(RateLimitConfig {
            max_per_second: Some(5),
            max_per_minute: None,
            max_per_hour: None,
        });
        let registry = ResilienceRegistry::new(with_default);
        let entry = registry.get_or_init(&ChannelId::new("sms:+1"), None, None);
        assert!(entry.rate_limiter.is_some());
    }

    #[test]
    fn a_binding_with_its_own_override_ignores_the_default_tier() {
        let mut with_default = defaults();
        with_default.default_rate_limit = Some(RateLimitConfig {
            max_per_second: Some(5),
            max_per_minute: None,
            max_per_hour: None,
        });
        let registry = ResilienceRegistry::new(with_default);
        let override_cfg = RateLimitConfig {
            max_per_second: None,
            max_per_minute: Some(30),
            max_per_hour: None,
        };
        let entry = registry.get_or_init(&ChannelId::new("sms:+1"), Some(&override_cfg), None);
        assert!(entry.rate_limiter.is_some());
    }

    #[test]
    fn distinct_channels_get_independent_entries() {
        let registry = ResilienceRegistry::new(defaults());
        let a = registry.get_or_init(&ChannelId::new("sms:+1"), None, None);
        let b = registry.get_or_init(&ChannelId::new("sms:+2"), None, None);
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
