use std::sync::Arc;

use roomkit_channel::ChannelRegistry;
use roomkit_core::{FrameworkEventBus, FrameworkEventSink, RoomkitConfig};
use roomkit_hooks::HookEngine;
use roomkit_identity::{CachingIdentityResolver, IdentityPipeline, IdentityResolver};
use roomkit_lock::LockManager;
use roomkit_resilience::{ResilienceDefaults, ResilienceRegistry, RetryPolicy};
use roomkit_router::{InboundRouter, StoreBackedRouter};
use roomkit_store::{RateLimitConfig, Store};

use crate::broadcast::EventRouter;
use crate::pipeline::InboundPipeline;

/// Wires the lock manager, hook engine, identity pipeline, resilience
/// registry, event router and framework-event bus into one
/// [`InboundPipeline`], reading every tunable from a [`RoomkitConfig`] so a
/// host doesn't have to hand-assemble the dependency graph itself. Every
/// collaborator has a sensible default and can be overridden individually.
pub struct RoomkitBuilder {
    store: Arc<dyn Store>,
    channels: Arc<ChannelRegistry>,
    config: RoomkitConfig,
    router: Option<Arc<dyn InboundRouter>>,
    identity_resolver: Option<Arc<dyn IdentityResolver>>,
    hooks: Arc<HookEngine>,
    event_sinks: Vec<Box<dyn FrameworkEventSink>>,
}

impl RoomkitBuilder {
    pub fn new(store: Arc<dyn Store>, channels: Arc<ChannelRegistry>, config: RoomkitConfig) -> Self {
        Self {
            store,
            channels,
            config,
            router: None,
            identity_resolver: None,
            hooks: Arc::new(HookEngine::new()),
            event_sinks: Vec::new(),
        }
    }

    /// Overrides the default store-backed router (e.g. with one consulting
    /// a CRM for participant-to-room resolution).
    pub fn with_router(mut self, router: Arc<dyn InboundRouter>) -> Self {
        self.router = Some(router);
        self
    }

    /// Overrides the default caching store-backed identity resolver.
    pub fn with_identity_resolver(mut self, resolver: Arc<dyn IdentityResolver>) -> Self {
        self.identity_resolver = Some(resolver);
        self
    }

    /// Supplies a pre-populated hook engine instead of an empty one.
    pub fn with_hooks(mut self, hooks: Arc<HookEngine>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Registers an additional framework-event sink alongside the always-on
    /// `tracing` sink.
    pub fn with_framework_event_sink(mut self, sink: Box<dyn FrameworkEventSink>) -> Self {
        self.event_sinks.push(sink);
        self
    }

    pub fn build(self) -> Arc<InboundPipeline> {
        let router = self
            .router
            .unwrap_or_else(|| Arc::new(StoreBackedRouter::new(self.store.clone())));

        let resolver = self.identity_resolver.unwrap_or_else(|| {
            Arc::new(CachingIdentityResolver::new(
                self.store.clone(),
                self.config.identity_cache_capacity,
            ))
        });
        let mut identity = IdentityPipeline::new(resolver, self.config.identity_timeout());
        if let Some(allow_list) = self.config.identity_channel_types.clone() {
            identity = identity.with_channel_allow_list(allow_list);
        }

        let mut events = FrameworkEventBus::new();
        for sink in self.event_sinks {
            events.register(sink);
        }
        let events = Arc::new(events);

        let locks = Arc::new(LockManager::new(self.config.lock_registry_capacity));

        let default_rate_limit = if self.config.default_rate_limit_max_per_second.is_some()
            || self.config.default_rate_limit_max_per_minute.is_some()
            || self.config.default_rate_limit_max_per_hour.is_some()
        {
            Some(RateLimitConfig {
                max_per_second: self.config.default_rate_limit_max_per_second,
                max_per_minute: self.config.default_rate_limit_max_per_minute,
                max_per_hour: self.config.default_rate_limit_max_per_hour,
            })
        } else {
            None
        };

        let resilience = Arc::new(ResilienceRegistry::new(ResilienceDefaults {
            failure_threshold: self.config.circuit_failure_threshold,
            recovery_time: self.config.circuit_recovery_time(),
            retry: RetryPolicy {
                max_retries: self.config.retry_max_retries,
                base_delay: self.config.retry_base_delay(),
                max_delay: self.config.retry_max_delay(),
                exponential_base: self.config.retry_exponential_base,
            },
            default_rate_limit,
        }));

        let event_router = Arc::new(EventRouter::new(
            self.store.clone(),
            self.channels.clone(),
            resilience,
            events.clone(),
            self.config.max_chain_depth,
        ));

        Arc::new(InboundPipeline::new(
            self.store,
            router,
            locks,
            self.hooks,
            Arc::new(identity),
            event_router,
            self.channels,
            events,
            self.config,
        ))
    }
}
