use std::sync::Arc;

use async_trait::async_trait;

use roomkit_core::{ChannelId, ParticipantId};
use roomkit_store::{RoomStatus, Store};

use crate::error::{Result, RouterError};
use crate::types::{RouteOutcome, RouteRequest};

/// Resolves an inbound message to the room it belongs in — the pluggable
/// seam for room resolution. A host may supply its own (e.g. one backed by
/// a CRM lookup); the default here only ever queries the store.
#[async_trait]
pub trait InboundRouter: Send + Sync {
    async fn route(&self, request: &RouteRequest) -> Result<RouteOutcome>;
}

/// Default router: first look up a binding already attached to
/// `channel_id`; failing that, fall back to the most recently active room
/// for `(channel_type, participant_id)`; failing that, signal `Create` so
/// the orchestrator materializes a fresh room. A room found this way that
/// has already transitioned to `closed` is not routable — inbound events
/// addressed to it are rejected rather than silently replayed into a dead
/// room.
pub struct StoreBackedRouter {
    store: Arc<dyn Store>,
}

impl StoreBackedRouter {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn reject_if_closed(&self, room_id: roomkit_core::RoomId) -> Result<RouteOutcome> {
        match self.store.get_room(&room_id).await? {
            Some(room) if room.status == RoomStatus::Closed => Err(RouterError::RoomClosed),
            _ => Ok(RouteOutcome::Existing(room_id)),
        }
    }

    async fn by_channel(&self, channel_id: &ChannelId) -> Result<Option<roomkit_core::RoomId>> {
        Ok(self.store.find_room_by_channel(channel_id).await?)
    }

    async fn by_channel_type_and_participant(
        &self,
        channel_type: &str,
        participant_id: &ParticipantId,
    ) -> Result<Option<roomkit_core::RoomId>> {
        Ok(self.store.find_latest_room(channel_type, participant_id).await?)
    }
}

#[async_trait]
impl InboundRouter for StoreBackedRouter {
    async fn route(&self, request: &RouteRequest) -> Result<RouteOutcome> {
        if let Some(room_id) = self.by_channel(&request.channel_id).await? {
            return self.reject_if_closed(room_id).await;
        }

        if let Some(participant_id) = &request.participant_id {
            if let Some(room_id) = self
                .by_channel_type_and_participant(&request.channel_type, participant_id)
                .await?
            {
                return self.reject_if_closed(room_id).await;
            }
        }

        Ok(RouteOutcome::Create)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use roomkit_store::{BindingDirection, Category, ChannelBinding, InMemoryStore, Room};

    #[tokio::test]
    async fn routes_to_the_room_a_channel_is_already_bound_to() {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let room = Room::new(roomkit_core::RoomId::generate(), Utc::now());
        store.create_room(room.clone()).await.unwrap();
        let channel_id = ChannelId::new("sms:+1");
        let binding = ChannelBinding::new(
            channel_id.clone(),
            room.id.clone(),
            "sms",
            Category::Transport,
            BindingDirection::Bidirectional,
            Utc::now(),
        );
        store.add_binding(binding).await.unwrap();

        let router = StoreBackedRouter::new(store);
        let outcome = router
            .route(&RouteRequest {
                channel_id,
                channel_type: "sms".into(),
                participant_id: None,
            })
            .await
            .unwrap();
        assert_eq!(outcome, RouteOutcome::Existing(room.id));
    }

    #[tokio::test]
    async fn unknown_channel_and_participant_signals_create() {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let router = StoreBackedRouter::new(store);
        let outcome = router
            .route(&RouteRequest {
                channel_id: ChannelId::new("sms:+9"),
                channel_type: "sms".into(),
                participant_id: None,
            })
            .await
            .unwrap();
        assert_eq!(outcome, RouteOutcome::Create);
    }

    #[tokio::test]
    async fn a_closed_room_rejects_routing_even_when_channel_matches() {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let mut room = Room::new(roomkit_core::RoomId::generate(), Utc::now());
        room.status = RoomStatus::Closed;
        store.create_room(room.clone()).await.unwrap();
        let channel_id = ChannelId::new("sms:+1");
        let binding = ChannelBinding::new(
            channel_id.clone(),
            room.id.clone(),
            "sms",
            Category::Transport,
            BindingDirection::Bidirectional,
            Utc::now(),
        );
        store.add_binding(binding).await.unwrap();

        let router = StoreBackedRouter::new(store);
        let result = router
            .route(&RouteRequest {
                channel_id,
                channel_type: "sms".into(),
                participant_id: None,
            })
            .await;
        assert!(matches!(result, Err(RouterError::RoomClosed)));
    }
}
