use tokio::sync::RwLock;

use roomkit_core::RoomId;
use roomkit_store::RoomEvent;

use crate::error::HookError;
use crate::types::{
    HookAction, HookContext, HookDefinition, HookExecution, HookScope, HookSideEffects, HookTrigger,
};

/// Outcome of running the sync chain for one trigger.
pub struct SyncPipelineResult {
    pub event: RoomEvent,
    pub blocked_by: Option<String>,
    pub side_effects: HookSideEffects,
}

/// Registry of registered hooks plus the sync/async execution semantics.
/// Sync hooks run sequentially in priority order and the first `Block`
/// stops the chain; async hooks run concurrently, each bounded by its own
/// timeout, and failures become non-fatal [`HookError`] entries attached to
/// the caller's result rather than failing the pipeline.
pub struct HookEngine {
    hooks: RwLock<Vec<HookDefinition>>,
}

impl Default for HookEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HookEngine {
    pub fn new() -> Self {
        Self {
            hooks: RwLock::new(Vec::new()),
        }
    }

    pub async fn register(&self, hook: HookDefinition) {
        let mut hooks = self.hooks.write().await;
        hooks.push(hook);
        hooks.sort_by_key(|h| h.priority);
    }

    pub async fn unregister(&self, name: &str) {
        let mut hooks = self.hooks.write().await;
        hooks.retain(|h| h.name != name);
    }

    /// Removes every hook scoped to `room_id` — used when a room closes.
    pub async fn unregister_room(&self, room_id: &RoomId) {
        let mut hooks = self.hooks.write().await;
        hooks.retain(|h| h.scope != HookScope::Room(room_id.clone()));
    }

    pub async fn run_sync(&self, room_id: &RoomId, ctx: HookContext) -> SyncPipelineResult {
        let hooks = self.hooks.read().await;
        let matching: Vec<&HookDefinition> = hooks
            .iter()
            .filter(|h| h.execution == HookExecution::Sync && h.matches(room_id, ctx.trigger, &ctx.event))
            .collect();

        let mut event = ctx.event;
        let mut side_effects = HookSideEffects::default();

        for hook in matching {
            let step_ctx = HookContext {
                event: event.clone(),
                trigger: ctx.trigger,
                timestamp: ctx.timestamp,
            };
            let outcome = hook.handler.handle(&step_ctx).await;
            side_effects.injected_events.extend(outcome.side_effects.injected_events);
            side_effects.tasks.extend(outcome.side_effects.tasks);
            side_effects.observations.extend(outcome.side_effects.observations);

            match outcome.action {
                HookAction::Allow => {}
                HookAction::AllowModified(modified) => {
                    event = modified;
                }
                HookAction::Block { reason } => {
                    tracing::debug!(hook = %hook.name, reason = %reason, "sync hook blocked event");
                    return SyncPipelineResult {
                        event,
                        blocked_by: Some(hook.name.clone()),
                        side_effects,
                    };
                }
            }
        }

        SyncPipelineResult {
            event,
            blocked_by: None,
            side_effects,
        }
    }

    /// Runs every matching async hook concurrently, each bounded by its own
    /// timeout. Returns the non-fatal errors collected along the way — the
    /// caller uses these only for reporting, never to alter the event.
    pub async fn run_async(&self, room_id: &RoomId, ctx: &HookContext) -> Vec<HookError> {
        let hooks = self.hooks.read().await;
        let matching: Vec<HookDefinition> = hooks
            .iter()
            .filter(|h| h.execution == HookExecution::Async && h.matches(room_id, ctx.trigger, &ctx.event))
            .cloned()
            .collect();
        drop(hooks);

        let futures = matching.into_iter().map(|hook| {
            let ctx = ctx.clone();
            async move {
                let name = hook.name.clone();
                let timeout = hook.timeout;
                match tokio::time::timeout(timeout, hook.handler.handle(&ctx)).await {
                    Ok(outcome) => {
                        if let HookAction::Block { reason } = outcome.action {
                            tracing::debug!(hook = %name, reason = %reason, "async hook requested block (ignored — async hooks cannot block)");
                        }
                        None
                    }
                    Err(_) => Some(HookError::Timeout {
                        name,
                        ms: timeout.as_millis() as u64,
                    }),
                }
            }
        });

        futures_util::future::join_all(futures)
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HookExecution, HookFilters, HookHandler, HookOutcome};
    use async_trait::async_trait;
    use chrono::Utc;
    use roomkit_store::{Content, Direction, EventSource, EventType};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn event() -> RoomEvent {
        RoomEvent::unindexed(
            RoomId::generate(),
            EventType::Message,
            EventSource {
                channel_id: roomkit_core::ChannelId::new("sms:+1"),
                channel_type: "sms".into(),
                direction: Direction::Inbound,
                participant_id: None,
                external_id: None,
            },
            Content::text("spam here"),
            Utc::now(),
        )
    }

    struct BlockOnSpam;
    #[async_trait]
    impl HookHandler for BlockOnSpam {
        async fn handle(&self, ctx: &HookContext) -> HookOutcome {
            if let Content::Text { body } = &ctx.event.content {
                if body.contains("spam") {
                    return HookOutcome::block("spam_filter");
                }
            }
            HookOutcome::allow()
        }
    }

    struct NeverCalled(Arc<AtomicUsize>);
    #[async_trait]
    impl HookHandler for NeverCalled {
        async fn handle(&self, _ctx: &HookContext) -> HookOutcome {
            self.0.fetch_add(1, Ordering::SeqCst);
            HookOutcome::allow()
        }
    }

    #[tokio::test]
    async fn block_stops_the_remaining_sync_chain() {
        let engine = HookEngine::new();
        let calls = Arc::new(AtomicUsize::new(0));
        engine
            .register(
                HookDefinition::new(
                    "spam_filter",
                    HookTrigger::BeforeBroadcast,
                    HookExecution::Sync,
                    Arc::new(BlockOnSpam),
                )
                .with_priority(0),
            )
            .await;
        engine
            .register(
                HookDefinition::new(
                    "should_not_run",
                    HookTrigger::BeforeBroadcast,
                    HookExecution::Sync,
                    Arc::new(NeverCalled(calls.clone())),
                )
                .with_priority(10),
            )
            .await;

        let room_id = RoomId::generate();
        let ctx = HookContext::new(event(), HookTrigger::BeforeBroadcast);
        let result = engine.run_sync(&room_id, ctx).await;

        assert_eq!(result.blocked_by.as_deref(), Some("spam_filter"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn filters_exclude_non_matching_channel_types() {
        let engine = HookEngine::new();
        let calls = Arc::new(AtomicUsize::new(0));
        engine
            .register(
                HookDefinition::new(
                    "email_only",
                    HookTrigger::BeforeBroadcast,
                    HookExecution::Sync,
                    Arc::new(NeverCalled(calls.clone())),
                )
                .with_filters(HookFilters {
                    channel_types: Some(vec!["email".into()]),
                    ..Default::default()
                }),
            )
            .await;

        let room_id = RoomId::generate();
        let ctx = HookContext::new(event(), HookTrigger::BeforeBroadcast);
        let result = engine.run_sync(&room_id, ctx).await;

        assert!(result.blocked_by.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    struct AlwaysTimesOut;
    #[async_trait]
    impl HookHandler for AlwaysTimesOut {
        async fn handle(&self, _ctx: &HookContext) -> HookOutcome {
            tokio::time::sleep(std::time::Duration::from_secs(10)).await;
            HookOutcome::allow()
        }
    }

    #[tokio::test]
    async fn async_hook_timeout_is_captured_not_propagated() {
        let engine = HookEngine::new();
        engine
            .register(
                HookDefinition::new(
                    "slow_webhook",
                    HookTrigger::AfterBroadcast,
                    HookExecution::Async,
                    Arc::new(AlwaysTimesOut),
                )
                .with_timeout(std::time::Duration::from_millis(10)),
            )
            .await;

        let room_id = RoomId::generate();
        let ctx = HookContext::new(event(), HookTrigger::AfterBroadcast);
        let errors = engine.run_async(&room_id, &ctx).await;
        assert_eq!(errors.len(), 1);
    }
}
