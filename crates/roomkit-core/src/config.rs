use std::time::Duration;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

fn default_process_timeout_ms() -> u64 {
    30_000
}
fn default_identity_timeout_ms() -> u64 {
    10_000
}
fn default_max_chain_depth() -> u32 {
    4
}
fn default_lock_registry_capacity() -> usize {
    1024
}
fn default_identity_cache_capacity() -> usize {
    256
}
fn default_realtime_subscriber_capacity() -> usize {
    1024
}
fn default_failure_threshold() -> u32 {
    5
}
fn default_recovery_time_ms() -> u64 {
    60_000
}
fn default_max_retries() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    500
}
fn default_max_delay_ms() -> u64 {
    30_000
}
fn default_exponential_base() -> f64 {
    2.0
}

/// Pipeline-wide tunables. Loaded from compiled-in defaults, optionally
/// overridden by a TOML file, then by `ROOMKIT_`-prefixed environment
/// variables — the same three-layer `figment` pattern the host project uses
/// for its own configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomkitConfig {
    /// Max time the inbound pipeline may hold a room's exclusive section.
    #[serde(default = "default_process_timeout_ms")]
    pub process_timeout_ms: u64,

    /// Max time the identity resolver is given before degrading to `unknown`.
    #[serde(default = "default_identity_timeout_ms")]
    pub identity_timeout_ms: u64,

    /// Maximum reentry generation depth before a response event is blocked.
    #[serde(default = "default_max_chain_depth")]
    pub max_chain_depth: u32,

    /// Capacity of the room-lock LRU registry.
    #[serde(default = "default_lock_registry_capacity")]
    pub lock_registry_capacity: usize,

    /// Capacity of the default identity resolver's address cache.
    #[serde(default = "default_identity_cache_capacity")]
    pub identity_cache_capacity: usize,

    /// Per-subscriber bounded queue depth on the realtime bus.
    #[serde(default = "default_realtime_subscriber_capacity")]
    pub realtime_subscriber_capacity: usize,

    /// Consecutive failures before a channel's circuit breaker opens.
    #[serde(default = "default_failure_threshold")]
    pub circuit_failure_threshold: u32,

    /// Time an open breaker stays open before admitting a probe.
    #[serde(default = "default_recovery_time_ms")]
    pub circuit_recovery_time_ms: u64,

    /// Max retry attempts for a transport delivery, beyond the first.
    #[serde(default = "default_max_retries")]
    pub retry_max_retries: u32,

    #[serde(default = "default_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    #[serde(default = "default_exponential_base")]
    pub retry_exponential_base: f64,

    /// If set, only these channel types go through identity resolution at all.
    #[serde(default)]
    pub identity_channel_types: Option<Vec<String>>,

    /// Default rate-limit tier applied to a transport binding that declares
    /// no `rate_limit` of its own. `None` means such bindings go unlimited,
    /// matching today's behavior for hosts that never opt in.
    #[serde(default)]
    pub default_rate_limit_max_per_second: Option<u32>,
    #[serde(default)]
    pub default_rate_limit_max_per_minute: Option<u32>,
    #[serde(default)]
    pub default_rate_limit_max_per_hour: Option<u32>,
}

impl Default for RoomkitConfig {
    fn default() -> Self {
        Self {
            process_timeout_ms: default_process_timeout_ms(),
            identity_timeout_ms: default_identity_timeout_ms(),
            max_chain_depth: default_max_chain_depth(),
            lock_registry_capacity: default_lock_registry_capacity(),
            identity_cache_capacity: default_identity_cache_capacity(),
            realtime_subscriber_capacity: default_realtime_subscriber_capacity(),
            circuit_failure_threshold: default_failure_threshold(),
            circuit_recovery_time_ms: default_recovery_time_ms(),
            retry_max_retries: default_max_retries(),
            retry_base_delay_ms: default_base_delay_ms(),
            retry_max_delay_ms: default_max_delay_ms(),
            retry_exponential_base: default_exponential_base(),
            identity_channel_types: None,
            default_rate_limit_max_per_second: None,
            default_rate_limit_max_per_minute: None,
            default_rate_limit_max_per_hour: None,
        }
    }
}

impl RoomkitConfig {
    /// Loads config from optional `path` (TOML), layered over the
    /// defaults above, then overridden by `ROOMKIT_*` environment variables.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut figment = Figment::from(figment::providers::Serialized::defaults(
            RoomkitConfig::default(),
        ));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed("ROOMKIT_").split("_"));
        figment
            .extract()
            .map_err(|e| CoreError::Config(e.to_string()))
    }

    pub fn process_timeout(&self) -> Duration {
        Duration::from_millis(self.process_timeout_ms)
    }

    pub fn identity_timeout(&self) -> Duration {
        Duration::from_millis(self.identity_timeout_ms)
    }

    pub fn circuit_recovery_time(&self) -> Duration {
        Duration::from_millis(self.circuit_recovery_time_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let cfg = RoomkitConfig::default();
        assert_eq!(cfg.process_timeout_ms, 30_000);
        assert_eq!(cfg.identity_timeout_ms, 10_000);
        assert_eq!(cfg.lock_registry_capacity, 1024);
        assert_eq!(cfg.circuit_failure_threshold, 5);
        assert_eq!(cfg.circuit_recovery_time_ms, 60_000);
    }

    #[test]
    fn load_with_no_file_falls_back_to_defaults() {
        let cfg = RoomkitConfig::load(None).expect("defaults should always load");
        assert_eq!(cfg.max_chain_depth, 4);
    }
}
