use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;

use roomkit_channel::{Channel, ChannelRegistry, InboundMessage, RoomContext};
use roomkit_core::{
    run_bounded, CancellationToken, FrameworkEvent, FrameworkEventBus, FrameworkEventName, Outcome,
    RoomkitConfig,
};
use roomkit_hooks::{HookContext, HookEngine, HookTrigger};
use roomkit_identity::{IdentityPipeline, IdentityResolution};
use roomkit_lock::LockManager;
use roomkit_router::{InboundRouter, RouteOutcome, RouteRequest, RouterError};
use roomkit_store::{
    BindingDirection, Category, ChannelBinding, Capabilities, EventStatus, Room, RoomEvent, Store,
};

use crate::broadcast::EventRouter;
use crate::error::{PipelineError, Result};
use crate::types::{BroadcastOutcome, ProcessInboundOutcome};

/// Orchestrates the canonical inbound order end-to-end: route, construct the
/// event, resolve identity, hold the room's exclusive section, run the
/// hook/broadcast/reentry cycle, and release.
pub struct InboundPipeline {
    store: Arc<dyn Store>,
    router: Arc<dyn InboundRouter>,
    locks: Arc<LockManager>,
    hooks: Arc<HookEngine>,
    identity: Arc<IdentityPipeline>,
    event_router: Arc<EventRouter>,
    channels: Arc<ChannelRegistry>,
    events: Arc<FrameworkEventBus>,
    config: RoomkitConfig,
}

impl InboundPipeline {
    pub fn new(
        store: Arc<dyn Store>,
        router: Arc<dyn InboundRouter>,
        locks: Arc<LockManager>,
        hooks: Arc<HookEngine>,
        identity: Arc<IdentityPipeline>,
        event_router: Arc<EventRouter>,
        channels: Arc<ChannelRegistry>,
        events: Arc<FrameworkEventBus>,
        config: RoomkitConfig,
    ) -> Self {
        Self {
            store,
            router,
            locks,
            hooks,
            identity,
            event_router,
            channels,
            events,
            config,
        }
    }

    /// Routes, constructs and fully processes one inbound message, returning
    /// the structured outcome a caller uses to decide whether to nack the
    /// source webhook, retry, or simply report.
    pub async fn process_inbound(
        &self,
        request: RouteRequest,
        message: InboundMessage,
        cancel: &CancellationToken,
    ) -> Result<ProcessInboundOutcome> {
        let room_id = self.ensure_room_and_binding(&request).await?;

        let binding = self
            .store
            .get_binding(&request.channel_id)
            .await?
            .ok_or(PipelineError::Routing(RouterError::RoutingFailed))?;
        let channel = self.channels.get(&request.channel_id);
        let ctx = RoomContext {
            room_id: room_id.clone(),
            binding: binding.clone(),
        };

        let event = match &channel {
            Some(channel) => channel
                .handle_inbound(message, &ctx)
                .await
                .map_err(PipelineError::Channel)?,
            None => RoomEvent::unindexed(
                room_id.clone(),
                roomkit_store::EventType::Message,
                roomkit_store::EventSource {
                    channel_id: request.channel_id.clone(),
                    channel_type: request.channel_type.clone(),
                    direction: roomkit_store::Direction::Inbound,
                    participant_id: request.participant_id.clone(),
                    external_id: message.external_id.clone(),
                },
                message.content,
                message.received_at,
            ),
        };

        let identity_outcome = self.identity.run(&event, cancel).await;
        if identity_outcome.timed_out {
            self.events.emit(
                FrameworkEvent::new(FrameworkEventName::IdentityTimeout, Utc::now()).with_room(room_id.clone()),
            );
        }
        let (identity_block, injected) = match identity_outcome.resolution {
            IdentityResolution::Rejected { reason } => (Some(format!("identity_rejected:{reason}")), None),
            IdentityResolution::ChallengeSent => {
                (Some("identity_challenge".to_string()), identity_outcome.injected_event)
            }
            _ => (None, None),
        };

        let section = self.locks.acquire(&room_id).await;
        let body = self.process_within_section(event, identity_block, injected, cancel);
        let outcome = run_bounded(body, self.config.process_timeout(), cancel).await;
        drop(section);

        match outcome {
            Outcome::Completed(result) => result,
            Outcome::TimedOut => {
                self.events.emit(
                    FrameworkEvent::new(FrameworkEventName::ProcessTimeout, Utc::now()).with_room(room_id),
                );
                Err(PipelineError::ProcessTimeout)
            }
            Outcome::Cancelled => Err(PipelineError::Cancelled),
        }
    }

    async fn ensure_room_and_binding(&self, request: &RouteRequest) -> Result<roomkit_core::RoomId> {
        match self.router.route(request).await? {
            RouteOutcome::Existing(room_id) => Ok(room_id),
            RouteOutcome::Create => {
                let now = Utc::now();
                let room = self.store.create_room(Room::new(roomkit_core::RoomId::generate(), now)).await?;
                self.events.emit(
                    FrameworkEvent::new(FrameworkEventName::RoomCreated, now).with_room(room.id.clone()),
                );

                let (category, capabilities) = match self.channels.get(&request.channel_id) {
                    Some(channel) => (channel.category(), channel.capabilities()),
                    None => (Category::Transport, Capabilities::text_only()),
                };
                let mut binding = ChannelBinding::new(
                    request.channel_id.clone(),
                    room.id.clone(),
                    request.channel_type.clone(),
                    category,
                    BindingDirection::Bidirectional,
                    now,
                );
                binding.capabilities = capabilities;
                self.store.add_binding(binding).await?;
                Ok(room.id)
            }
        }
    }

    /// Runs the locked portion of the pipeline, under the room's exclusive section and bound
    /// by `process_timeout`.
    async fn process_within_section(
        &self,
        mut event: RoomEvent,
        identity_block: Option<String>,
        injected: Option<RoomEvent>,
        cancel: &CancellationToken,
    ) -> Result<ProcessInboundOutcome> {
        if let Some(key) = event.idempotency_key.clone() {
            if let Some(existing) = self.store.find_event_by_idempotency_key(&event.room_id, &key).await? {
                return Ok(ProcessInboundOutcome {
                    blocked: existing.status == EventStatus::Blocked,
                    blocked_reason: existing.blocked_by.clone(),
                    event: Some(existing),
                    hook_errors: Vec::new(),
                    delivery_results: Vec::new(),
                });
            }
        }

        if let Some(reason) = identity_block {
            event.mark_blocked(reason);
            let (persisted, _) = self.store.add_event(event).await?;
            self.events.emit(
                FrameworkEvent::new(FrameworkEventName::EventBlocked, Utc::now()).with_room(persisted.room_id.clone()),
            );
            if let Some(challenge) = injected {
                let (persisted_challenge, is_new) = self.store.add_event(challenge).await?;
                if is_new {
                    let _ = self.event_router.broadcast(&persisted_challenge).await;
                }
            }
            return Ok(ProcessInboundOutcome::blocked(
                persisted.clone(),
                persisted.blocked_by.clone().unwrap_or_default(),
            ));
        }

        let before_ctx = HookContext::new(event.clone(), HookTrigger::BeforeBroadcast);
        let sync_result = self.hooks.run_sync(&event.room_id, before_ctx.clone()).await;
        let mut hook_errors = self.hooks.run_async(&event.room_id, &before_ctx).await;

        if let Some(by) = sync_result.blocked_by {
            let mut blocked_event = sync_result.event;
            blocked_event.mark_blocked(by.clone());
            let (persisted, _) = self.store.add_event(blocked_event).await?;
            self.persist_side_effects(&sync_result.side_effects).await?;
            self.events.emit(
                FrameworkEvent::new(FrameworkEventName::EventBlocked, Utc::now()).with_room(persisted.room_id.clone()),
            );
            return Ok(ProcessInboundOutcome {
                blocked: true,
                blocked_reason: Some(by),
                event: Some(persisted),
                hook_errors,
                delivery_results: Vec::new(),
            });
        }

        let (persisted, _) = self.store.add_event(sync_result.event).await?;
        self.persist_side_effects(&sync_result.side_effects).await?;

        let mut accumulated = self.event_router.broadcast(&persisted).await?;
        self.drain_reentry(&mut accumulated, &mut hook_errors, cancel).await?;

        self.persist_tasks_and_observations(&accumulated).await?;

        let after_ctx = HookContext::new(persisted.clone(), HookTrigger::AfterBroadcast);
        hook_errors.extend(self.hooks.run_async(&persisted.room_id, &after_ctx).await);

        Ok(ProcessInboundOutcome {
            event: Some(persisted),
            blocked: false,
            blocked_reason: None,
            hook_errors,
            delivery_results: accumulated.delivery_results,
        })
    }

    /// Drains reentry events FIFO within the same section, running
    /// `before_broadcast` hooks and broadcasting each before enqueuing its
    /// own children.
    async fn drain_reentry(
        &self,
        accumulated: &mut BroadcastOutcome,
        hook_errors: &mut Vec<roomkit_hooks::HookError>,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        let mut queue: VecDeque<RoomEvent> = accumulated.reentry_queue.drain(..).collect();

        while let Some(candidate) = queue.pop_front() {
            let before_ctx = HookContext::new(candidate.clone(), HookTrigger::BeforeBroadcast);
            let sync_result = self.hooks.run_sync(&candidate.room_id, before_ctx.clone()).await;
            hook_errors.extend(self.hooks.run_async(&candidate.room_id, &before_ctx).await);

            if let Some(by) = sync_result.blocked_by {
                let mut blocked_event = sync_result.event;
                blocked_event.mark_blocked(by);
                let (persisted, _) = self.store.add_event(blocked_event).await?;
                self.persist_side_effects(&sync_result.side_effects).await?;
                self.events.emit(
                    FrameworkEvent::new(FrameworkEventName::EventBlocked, Utc::now())
                        .with_room(persisted.room_id.clone()),
                );
                continue;
            }

            let (persisted, _) = self.store.add_event(sync_result.event).await?;
            self.persist_side_effects(&sync_result.side_effects).await?;

            let child_outcome = self.event_router.broadcast(&persisted).await?;
            for grandchild in child_outcome.reentry_queue {
                queue.push_back(grandchild);
            }
            accumulated.delivery_results.extend(child_outcome.delivery_results);
            accumulated.tasks.extend(child_outcome.tasks);
            accumulated.observations.extend(child_outcome.observations);

            let after_ctx = HookContext::new(persisted.clone(), HookTrigger::AfterBroadcast);
            hook_errors.extend(self.hooks.run_async(&persisted.room_id, &after_ctx).await);
        }

        Ok(())
    }

    async fn persist_side_effects(&self, side_effects: &roomkit_hooks::HookSideEffects) -> Result<()> {
        for event in side_effects.injected_events.clone() {
            self.store.add_event(event).await?;
        }
        for task in side_effects.tasks.clone() {
            self.store.add_task(task).await?;
        }
        for observation in side_effects.observations.clone() {
            self.store.add_observation(observation).await?;
        }
        Ok(())
    }

    async fn persist_tasks_and_observations(&self, outcome: &BroadcastOutcome) -> Result<()> {
        for task in outcome.tasks.clone() {
            self.store.add_task(task).await?;
        }
        for observation in outcome.observations.clone() {
            self.store.add_observation(observation).await?;
        }
        Ok(())
    }
}
