use std::sync::Arc;

use dashmap::DashMap;

use roomkit_core::ChannelId;

use crate::channel::Channel;

/// Live adapter instances keyed by `channel_id`. The pipeline and event
/// router dispatch through this registry rather than holding adapters
/// themselves — a channel is registered once, independent of how many
/// rooms its bindings span.
#[derive(Default)]
pub struct ChannelRegistry {
    channels: DashMap<ChannelId, Arc<dyn Channel>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, channel_id: ChannelId, channel: Arc<dyn Channel>) {
        self.channels.insert(channel_id, channel);
    }

    pub fn get(&self, channel_id: &ChannelId) -> Option<Arc<dyn Channel>> {
        self.channels.get(channel_id).map(|c| c.clone())
    }

    pub fn remove(&self, channel_id: &ChannelId) -> Option<Arc<dyn Channel>> {
        self.channels.remove(channel_id).map(|(_, c)| c)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Connects every registered adapter, collecting each failure alongside
    /// the `channel_id` that produced it rather than aborting on the first.
    pub async fn connect_all(&self) -> Vec<(ChannelId, crate::error::ChannelError)> {
        let channels: Vec<(ChannelId, Arc<dyn Channel>)> =
            self.channels.iter().map(|e| (e.key().clone(), e.value().clone())).collect();
        let mut failures = Vec::new();
        for (channel_id, channel) in channels {
            if let Err(e) = channel.connect().await {
                failures.push((channel_id, e));
            }
        }
        failures
    }

    /// Closes every registered adapter, releasing its provider resources.
    /// Failures are logged and otherwise non-fatal — shutdown proceeds
    /// through the remaining adapters regardless.
    pub async fn close_all(&self) {
        let channels: Vec<(ChannelId, Arc<dyn Channel>)> =
            self.channels.iter().map(|e| (e.key().clone(), e.value().clone())).collect();
        for (channel_id, channel) in channels {
            if let Err(e) = channel.close().await {
                tracing::warn!(channel_id = %channel_id, error = %e, "channel close failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::types::{ChannelEventOutcome, ChannelStatus, InboundMessage};
    use async_trait::async_trait;
    use roomkit_store::{Capabilities, Category, RoomEvent};

    struct Stub;
    #[async_trait]
    impl Channel for Stub {
        fn channel_type(&self) -> &str {
            "stub"
        }
        fn category(&self) -> Category {
            Category::Transport
        }
        fn capabilities(&self) -> Capabilities {
            Capabilities::text_only()
        }
        async fn connect(&self) -> Result<()> {
            Ok(())
        }
        async fn disconnect(&self) -> Result<()> {
            Ok(())
        }
        fn status(&self) -> ChannelStatus {
            ChannelStatus::Connected
        }
        async fn handle_inbound(
            &self,
            _message: InboundMessage,
            _ctx: &crate::channel::RoomContext,
        ) -> Result<RoomEvent> {
            unimplemented!()
        }
        async fn deliver(&self, _event: &RoomEvent, _ctx: &crate::channel::RoomContext) -> Result<()> {
            Ok(())
        }
        async fn on_event(
            &self,
            _event: &RoomEvent,
            _ctx: &crate::channel::RoomContext,
        ) -> Result<ChannelEventOutcome> {
            Ok(ChannelEventOutcome::default())
        }
    }

    #[test]
    fn register_then_get_returns_the_same_adapter() {
        let registry = ChannelRegistry::new();
        let channel_id = ChannelId::new("sms:+1");
        registry.register(channel_id.clone(), Arc::new(Stub));
        assert!(registry.get(&channel_id).is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn removing_an_unregistered_channel_is_a_no_op() {
        let registry = ChannelRegistry::new();
        assert!(registry.remove(&ChannelId::new("missing")).is_none());
    }

    #[tokio::test]
    async fn connect_all_and_close_all_reach_every_registered_adapter_through_the_shared_arc() {
        let registry = ChannelRegistry::new();
        let channel_id = ChannelId::new("sms:+1");
        registry.register(channel_id.clone(), Arc::new(Stub));

        assert!(registry.connect_all().await.is_empty());
        registry.close_all().await;

        // connect/disconnect/close stay directly callable on an `Arc<dyn Channel>`
        // pulled straight out of the registry, with no `&mut` required.
        let channel = registry.get(&channel_id).unwrap();
        channel.connect().await.unwrap();
        channel.close().await.unwrap();
    }
}
