use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use roomkit_channel::{Channel, ChannelRegistry, RoomContext};
use roomkit_core::{FrameworkEvent, FrameworkEventBus, FrameworkEventName};
use roomkit_resilience::{retry_with_backoff, ResilienceError, ResilienceRegistry};
use roomkit_store::{
    Category, ChannelBinding, Content, EventSource, Observation, OverlengthPolicy, RoomEvent, Store,
    Visibility,
};
use roomkit_transcode::transcode;

use crate::error::Result;
use crate::types::{BroadcastOutcome, DeliveryResult, DeliveryResultKind};

/// The per-target eligibility, transcoding, delivery and
/// reentry-collection decision tree run once per broadcast pass.
pub struct EventRouter {
    store: Arc<dyn Store>,
    channels: Arc<ChannelRegistry>,
    resilience: Arc<ResilienceRegistry>,
    events: Arc<FrameworkEventBus>,
    max_chain_depth: u32,
}

impl EventRouter {
    pub fn new(
        store: Arc<dyn Store>,
        channels: Arc<ChannelRegistry>,
        resilience: Arc<ResilienceRegistry>,
        events: Arc<FrameworkEventBus>,
        max_chain_depth: u32,
    ) -> Self {
        Self {
            store,
            channels,
            resilience,
            events,
            max_chain_depth,
        }
    }

    /// Broadcasts `event` to every eligible binding in its room, excluding
    /// the originating channel. Reentry events that would exceed
    /// `max_chain_depth` are persisted directly as blocked, with a paired
    /// observation; everything else comes back in `reentry_queue` for the
    /// caller's drain loop.
    pub async fn broadcast(&self, event: &RoomEvent) -> Result<BroadcastOutcome> {
        let Some(source) = self.store.get_binding(&event.source.channel_id).await? else {
            tracing::warn!(channel_id = %event.source.channel_id, "broadcast source binding missing, skipping");
            return Ok(BroadcastOutcome::default());
        };
        if !source.access.can_write() {
            return Ok(BroadcastOutcome::default());
        }
        if source.muted {
            return Ok(BroadcastOutcome::default());
        }

        let bindings = self.store.list_bindings(&event.room_id).await?;
        let targets: Vec<ChannelBinding> = bindings
            .into_iter()
            .filter(|b| b.channel_id != source.channel_id)
            .collect();

        let futures = targets
            .into_iter()
            .map(|target| self.process_target(event, target));
        let results = futures_util::future::join_all(futures).await;

        let mut outcome = BroadcastOutcome::default();
        let mut raw_reentry = Vec::new();
        for mut per_target in results {
            raw_reentry.append(&mut per_target.1);
            outcome.merge(per_target.0);
        }

        for mut reentry in raw_reentry {
            let new_depth = event.chain_depth + 1;
            if new_depth > self.max_chain_depth {
                reentry.chain_depth = new_depth;
                reentry.parent_event_id = Some(event.id.clone());
                reentry.mark_blocked("event_chain_depth_limit");
                let (persisted, _) = self.store.add_event(reentry).await?;
                let observation = Observation::new(
                    event.room_id.clone(),
                    "chain_depth_exceeded",
                    json!({ "event_id": persisted.id.to_string(), "chain_depth": new_depth }),
                    Utc::now(),
                )
                .for_event(persisted.id.clone());
                self.store.add_observation(observation).await?;
                self.events.emit(
                    FrameworkEvent::new(FrameworkEventName::ChainDepthExceeded, Utc::now())
                        .with_room(event.room_id.clone()),
                );
            } else {
                reentry.chain_depth = new_depth;
                reentry.parent_event_id = Some(event.id.clone());
                outcome.reentry_queue.push(reentry);
            }
        }

        Ok(outcome)
    }

    /// Runs the full per-binding pipeline for one target, returning its
    /// contribution to the broadcast outcome and any raw (not yet
    /// depth-checked) reentry events it produced.
    async fn process_target(
        &self,
        event: &RoomEvent,
        target: ChannelBinding,
    ) -> (BroadcastOutcome, Vec<RoomEvent>) {
        let mut outcome = BroadcastOutcome::default();

        if !target.access.can_read() {
            outcome.delivery_results.push(DeliveryResult::new(
                target.channel_id.clone(),
                event.id.clone(),
                DeliveryResultKind::Skipped {
                    reason: "no_read_access".into(),
                },
            ));
            return (outcome, Vec::new());
        }

        let intelligence = target.category == Category::Intelligence;
        if !intelligence && !visibility_allows(&event.visibility, &target) {
            outcome.delivery_results.push(DeliveryResult::new(
                target.channel_id.clone(),
                event.id.clone(),
                DeliveryResultKind::Skipped {
                    reason: "visibility".into(),
                },
            ));
            return (outcome, Vec::new());
        }

        let transcoded = match transcode(&event.content, &target.capabilities) {
            Ok(content) => content,
            Err(_) => {
                self.events.emit(
                    FrameworkEvent::new(FrameworkEventName::TranscodingFailed, Utc::now())
                        .with_room(event.room_id.clone())
                        .with_channel(target.channel_id.clone()),
                );
                outcome
                    .delivery_results
                    .push(DeliveryResult::new(target.channel_id.clone(), event.id.clone(), DeliveryResultKind::TranscodingFailed));
                return (outcome, Vec::new());
            }
        };

        let transcoded = match enforce_max_length(transcoded, &target) {
            Some(content) => content,
            None => {
                outcome.delivery_results.push(DeliveryResult::new(
                    target.channel_id.clone(),
                    event.id.clone(),
                    DeliveryResultKind::Skipped {
                        reason: "overlength".into(),
                    },
                ));
                return (outcome, Vec::new());
            }
        };

        let mut final_event = event.clone();
        final_event.content = transcoded;

        let Some(channel) = self.channels.get(&target.channel_id) else {
            outcome.delivery_results.push(DeliveryResult::new(
                target.channel_id.clone(),
                event.id.clone(),
                DeliveryResultKind::Skipped {
                    reason: "channel_not_registered".into(),
                },
            ));
            return (outcome, Vec::new());
        };

        let ctx = RoomContext {
            room_id: event.room_id.clone(),
            binding: target.clone(),
        };

        let on_event_outcome = match channel.on_event(&final_event, &ctx).await {
            Ok(o) => o,
            Err(e) => {
                tracing::warn!(channel_id = %target.channel_id, error = %e, "on_event failed");
                Default::default()
            }
        };

        outcome.tasks.extend(on_event_outcome.tasks);
        outcome.observations.extend(on_event_outcome.observations);
        let mut reentry = if intelligence && target.muted {
            Vec::new()
        } else {
            on_event_outcome.response_events
        };
        for e in &mut reentry {
            e.source = EventSource {
                channel_id: target.channel_id.clone(),
                channel_type: target.channel_type.clone(),
                direction: roomkit_store::Direction::Outbound,
                participant_id: target.participant_id.clone(),
                external_id: None,
            };
            e.room_id = event.room_id.clone();
        }

        if target.category == Category::Transport {
            let resilience = self.resilience.get_or_init(
                &target.channel_id,
                target.rate_limit.as_ref(),
                target.retry_policy.as_ref(),
            );
            let channel_for_delivery = channel.clone();
            let delivery_event = final_event.clone();
            let ctx_for_delivery = ctx;
            let result = resilience
                .breaker
                .run(|| async {
                    if let Some(limiter) = &resilience.rate_limiter {
                        limiter.acquire().await;
                    }
                    retry_with_backoff(&resilience.retry, || {
                        channel_for_delivery.deliver(&delivery_event, &ctx_for_delivery)
                    })
                    .await
                })
                .await;

            match result {
                Ok(()) => {
                    self.events.emit(
                        FrameworkEvent::new(FrameworkEventName::DeliverySucceeded, Utc::now())
                            .with_room(event.room_id.clone())
                            .with_channel(target.channel_id.clone()),
                    );
                    outcome.delivery_results.push(DeliveryResult::new(
                        target.channel_id.clone(),
                        event.id.clone(),
                        DeliveryResultKind::Delivered,
                    ));
                }
                Err(ResilienceError::CircuitOpen) => {
                    outcome.delivery_results.push(DeliveryResult::new(
                        target.channel_id.clone(),
                        event.id.clone(),
                        DeliveryResultKind::CircuitOpen,
                    ));
                }
                Err(ResilienceError::Inner(e)) | Err(ResilienceError::RetriesExhausted(e)) => {
                    self.events.emit(
                        FrameworkEvent::new(FrameworkEventName::DeliveryFailed, Utc::now())
                            .with_room(event.room_id.clone())
                            .with_channel(target.channel_id.clone())
                            .with_data(json!({ "error": e.to_string() })),
                    );
                    outcome.delivery_results.push(DeliveryResult::new(
                        target.channel_id.clone(),
                        event.id.clone(),
                        DeliveryResultKind::Failed { error: e.to_string() },
                    ));
                }
            }
        }

        (outcome, reentry)
    }
}

/// A target's declared `visibility` is transparent to intelligence-category
/// bindings — they always see broadcast events for context, even
/// `none`-visibility ones (an intentional design choice, not an oversight).
fn visibility_allows(visibility: &Visibility, target: &ChannelBinding) -> bool {
    match visibility {
        Visibility::All => true,
        Visibility::None => false,
        Visibility::Transport => target.category == Category::Transport,
        Visibility::Intelligence => target.category == Category::Intelligence,
        Visibility::Channels { ids } => ids.contains(&target.channel_id),
    }
}

/// Applies the target's `max_length`/`on_overlength` policy to already
/// transcoded text content. Returns `None` when the binding's policy is
/// `reject` and the content is over length.
fn enforce_max_length(content: Content, target: &ChannelBinding) -> Option<Content> {
    let Some(max) = target.capabilities.max_length else {
        return Some(content);
    };
    let Content::Text { body } = &content else {
        return Some(content);
    };
    if body.chars().count() <= max {
        return Some(content);
    }
    match target.capabilities.on_overlength {
        OverlengthPolicy::Truncate => {
            let truncated: String = body.chars().take(max).collect();
            Some(Content::text(truncated))
        }
        OverlengthPolicy::Reject => None,
    }
}
