use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex as AsyncMutex;

use roomkit_core::{ChannelId, EventId, IdentityId, ParticipantId, RoomId, TaskId};

use crate::binding::ChannelBinding;
use crate::error::{Result, StoreError};
use crate::event::RoomEvent;
use crate::identity::Identity;
use crate::observation::Observation;
use crate::participant::{Participant, ParticipantStatus};
use crate::room::Room;
use crate::store::Store;
use crate::task::{Task, TaskStatus};

/// Reference [`Store`] implementation backing everything with in-process
/// maps. Per-room event ledgers are each behind their own async mutex so
/// `add_event`'s index assignment is atomic without needing the caller's
/// room-lock section to also serialize storage internals — in production a
/// host is expected to supply its own backend behind the same trait.
#[derive(Default)]
pub struct InMemoryStore {
    rooms: DashMap<RoomId, Room>,
    events: DashMap<RoomId, AsyncMutex<Vec<RoomEvent>>>,
    idempotency: DashMap<(RoomId, String), EventId>,
    bindings: DashMap<ChannelId, ChannelBinding>,
    participants: DashMap<ParticipantId, Participant>,
    identities: DashMap<IdentityId, Identity>,
    identity_by_address: DashMap<(String, String), IdentityId>,
    tasks: DashMap<TaskId, Task>,
    observations: DashMap<roomkit_core::ObservationId, Observation>,
    read_index: DashMap<ChannelId, i64>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn create_room(&self, room: Room) -> Result<Room> {
        self.events.entry(room.id.clone()).or_insert_with(|| AsyncMutex::new(Vec::new()));
        self.rooms.insert(room.id.clone(), room.clone());
        Ok(room)
    }

    async fn get_room(&self, room_id: &RoomId) -> Result<Option<Room>> {
        Ok(self.rooms.get(room_id).map(|r| r.clone()))
    }

    async fn update_room(&self, room: Room) -> Result<Room> {
        self.rooms.insert(room.id.clone(), room.clone());
        Ok(room)
    }

    async fn delete_room(&self, room_id: &RoomId) -> Result<()> {
        self.rooms.remove(room_id);
        self.events.remove(room_id);
        Ok(())
    }

    async fn list_rooms(&self) -> Result<Vec<Room>> {
        Ok(self.rooms.iter().map(|e| e.value().clone()).collect())
    }

    async fn find_room_by_channel(&self, channel_id: &ChannelId) -> Result<Option<RoomId>> {
        Ok(self.bindings.get(channel_id).map(|b| b.room_id.clone()))
    }

    async fn find_latest_room(
        &self,
        channel_type: &str,
        participant_id: &ParticipantId,
    ) -> Result<Option<RoomId>> {
        let mut best: Option<(chrono::DateTime<Utc>, RoomId)> = None;
        for entry in self.participants.iter() {
            let p = entry.value();
            if &p.id == participant_id && p.status == ParticipantStatus::Active {
                if let Some(binding) = self.bindings.get(&p.channel_id) {
                    if binding.channel_type == channel_type {
                        if best.as_ref().map(|(t, _)| p.updated_at > *t).unwrap_or(true) {
                            best = Some((p.updated_at, p.room_id.clone()));
                        }
                    }
                }
            }
        }
        Ok(best.map(|(_, room_id)| room_id))
    }

    async fn add_event(&self, mut event: RoomEvent) -> Result<(RoomEvent, bool)> {
        let ledger = self
            .events
            .entry(event.room_id.clone())
            .or_insert_with(|| AsyncMutex::new(Vec::new()));
        let mut guard = ledger.value().lock().await;

        if let Some(key) = event.idempotency_key.clone() {
            if let Some(existing_id) = self.idempotency.get(&(event.room_id.clone(), key)) {
                if let Some(existing) = guard.iter().find(|e| e.id == *existing_id) {
                    return Ok((existing.clone(), false));
                }
            }
        }

        let next_index = guard.last().map(|e| e.index + 1).unwrap_or(0);
        event.index = next_index;
        guard.push(event.clone());

        if let Some(key) = event.idempotency_key.clone() {
            self.idempotency.insert((event.room_id.clone(), key), event.id.clone());
        }

        if let Some(mut room) = self.rooms.get_mut(&event.room_id) {
            room.latest_index = event.index;
            room.event_count = guard.len() as u64;
            room.updated_at = event.created_at;
        }

        Ok((event, true))
    }

    async fn get_event(&self, event_id: &EventId) -> Result<Option<RoomEvent>> {
        for ledger in self.events.iter() {
            let guard = ledger.value().lock().await;
            if let Some(e) = guard.iter().find(|e| &e.id == event_id) {
                return Ok(Some(e.clone()));
            }
        }
        Ok(None)
    }

    async fn find_event_by_idempotency_key(
        &self,
        room_id: &RoomId,
        key: &str,
    ) -> Result<Option<RoomEvent>> {
        let Some(event_id) = self
            .idempotency
            .get(&(room_id.clone(), key.to_string()))
            .map(|e| e.clone())
        else {
            return Ok(None);
        };
        self.get_event(&event_id).await
    }

    async fn list_events(&self, room_id: &RoomId, since_index: i64, limit: usize) -> Result<Vec<RoomEvent>> {
        let Some(ledger) = self.events.get(room_id) else {
            return Ok(Vec::new());
        };
        let guard = ledger.value().lock().await;
        Ok(guard
            .iter()
            .filter(|e| e.index > since_index)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn event_count(&self, room_id: &RoomId) -> Result<u64> {
        let Some(ledger) = self.events.get(room_id) else {
            return Ok(0);
        };
        Ok(ledger.value().lock().await.len() as u64)
    }

    async fn add_binding(&self, binding: ChannelBinding) -> Result<ChannelBinding> {
        self.bindings.insert(binding.channel_id.clone(), binding.clone());
        Ok(binding)
    }

    async fn get_binding(&self, channel_id: &ChannelId) -> Result<Option<ChannelBinding>> {
        Ok(self.bindings.get(channel_id).map(|b| b.clone()))
    }

    async fn update_binding(&self, binding: ChannelBinding) -> Result<ChannelBinding> {
        self.bindings.insert(binding.channel_id.clone(), binding.clone());
        Ok(binding)
    }

    async fn remove_binding(&self, channel_id: &ChannelId) -> Result<()> {
        self.bindings.remove(channel_id);
        self.read_index.remove(channel_id);
        Ok(())
    }

    async fn list_bindings(&self, room_id: &RoomId) -> Result<Vec<ChannelBinding>> {
        Ok(self
            .bindings
            .iter()
            .filter(|b| &b.room_id == room_id)
            .map(|b| b.value().clone())
            .collect())
    }

    async fn add_participant(&self, participant: Participant) -> Result<Participant> {
        self.participants.insert(participant.id.clone(), participant.clone());
        Ok(participant)
    }

    async fn get_participant(&self, participant_id: &ParticipantId) -> Result<Option<Participant>> {
        Ok(self.participants.get(participant_id).map(|p| p.clone()))
    }

    async fn update_participant_status(
        &self,
        participant_id: &ParticipantId,
        status: ParticipantStatus,
    ) -> Result<()> {
        if let Some(mut p) = self.participants.get_mut(participant_id) {
            p.status = status;
            p.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn list_participants(&self, room_id: &RoomId) -> Result<Vec<Participant>> {
        Ok(self
            .participants
            .iter()
            .filter(|p| &p.room_id == room_id)
            .map(|p| p.value().clone())
            .collect())
    }

    async fn create_identity(&self, identity: Identity) -> Result<Identity> {
        for addr in &identity.channel_addresses {
            self.identity_by_address
                .insert((addr.channel_type.clone(), addr.address.clone()), identity.id.clone());
        }
        self.identities.insert(identity.id.clone(), identity.clone());
        Ok(identity)
    }

    async fn get_identity(&self, identity_id: &IdentityId) -> Result<Option<Identity>> {
        Ok(self.identities.get(identity_id).map(|i| i.clone()))
    }

    async fn resolve_identity(&self, channel_type: &str, address: &str) -> Result<Option<Identity>> {
        let Some(identity_id) = self
            .identity_by_address
            .get(&(channel_type.to_string(), address.to_string()))
            .map(|e| e.clone())
        else {
            return Ok(None);
        };
        self.get_identity(&identity_id).await
    }

    async fn link_address(
        &self,
        identity_id: &IdentityId,
        channel_type: &str,
        address: &str,
        verified: bool,
    ) -> Result<()> {
        if let Some(mut identity) = self.identities.get_mut(identity_id) {
            identity.channel_addresses.push(crate::identity::ChannelAddress {
                channel_type: channel_type.to_string(),
                address: address.to_string(),
                verified,
            });
            identity.updated_at = Utc::now();
        } else {
            return Err(StoreError::Backend(format!("identity {identity_id} not found")));
        }
        self.identity_by_address
            .insert((channel_type.to_string(), address.to_string()), identity_id.clone());
        Ok(())
    }

    async fn add_task(&self, task: Task) -> Result<Task> {
        self.tasks.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    async fn list_tasks(&self, room_id: &RoomId, status: Option<TaskStatus>) -> Result<Vec<Task>> {
        Ok(self
            .tasks
            .iter()
            .filter(|t| &t.room_id == room_id && status.map(|s| s == t.status).unwrap_or(true))
            .map(|t| t.value().clone())
            .collect())
    }

    async fn update_task_status(&self, task_id: &TaskId, status: TaskStatus) -> Result<()> {
        if let Some(mut t) = self.tasks.get_mut(task_id) {
            t.status = status;
            t.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn add_observation(&self, observation: Observation) -> Result<Observation> {
        self.observations.insert(observation.id.clone(), observation.clone());
        Ok(observation)
    }

    async fn list_observations(&self, room_id: &RoomId) -> Result<Vec<Observation>> {
        Ok(self
            .observations
            .iter()
            .filter(|o| &o.room_id == room_id)
            .map(|o| o.value().clone())
            .collect())
    }

    async fn mark_read(&self, channel_id: &ChannelId, up_to_index: i64) -> Result<()> {
        self.read_index.insert(channel_id.clone(), up_to_index);
        Ok(())
    }

    async fn mark_all_read(&self, room_id: &RoomId) -> Result<()> {
        let latest = self
            .rooms
            .get(room_id)
            .map(|r| r.latest_index)
            .unwrap_or(-1);
        for binding in self.list_bindings(room_id).await? {
            self.read_index.insert(binding.channel_id, latest);
        }
        Ok(())
    }

    async fn unread_count(&self, channel_id: &ChannelId) -> Result<u64> {
        let Some(binding) = self.bindings.get(channel_id) else {
            return Ok(0);
        };
        let room_id = binding.room_id.clone();
        drop(binding);
        let last_read = self.read_index.get(channel_id).map(|i| *i).unwrap_or(-1);
        let latest = self.rooms.get(&room_id).map(|r| r.latest_index).unwrap_or(-1);
        Ok((latest - last_read).max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Content;
    use crate::event::{Direction, EventSource, EventType};

    fn source() -> EventSource {
        EventSource {
            channel_id: ChannelId::new("sms:+1"),
            channel_type: "sms".into(),
            direction: Direction::Inbound,
            participant_id: None,
            external_id: None,
        }
    }

    #[tokio::test]
    async fn indices_are_gap_free_and_monotone() {
        let store = InMemoryStore::new();
        let room = Room::new(RoomId::generate(), Utc::now());
        store.create_room(room.clone()).await.unwrap();

        let mut last = -1;
        for i in 0..5 {
            let event = RoomEvent::unindexed(
                room.id.clone(),
                EventType::Message,
                source(),
                Content::text(format!("msg {i}")),
                Utc::now(),
            );
            let (stored, is_new) = store.add_event(event).await.unwrap();
            assert!(is_new);
            assert_eq!(stored.index, last + 1);
            last = stored.index;
        }
    }

    #[tokio::test]
    async fn idempotency_key_returns_the_prior_event() {
        let store = InMemoryStore::new();
        let room = Room::new(RoomId::generate(), Utc::now());
        store.create_room(room.clone()).await.unwrap();

        let mut event = RoomEvent::unindexed(
            room.id.clone(),
            EventType::Message,
            source(),
            Content::text("hi"),
            Utc::now(),
        );
        event.idempotency_key = Some("k1".into());

        let (first, first_new) = store.add_event(event.clone()).await.unwrap();
        let (second, second_new) = store.add_event(event).await.unwrap();

        assert!(first_new);
        assert!(!second_new);
        assert_eq!(first.id, second.id);
        assert_eq!(store.event_count(&room.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unread_count_reflects_latest_minus_last_read() {
        let store = InMemoryStore::new();
        let room = Room::new(RoomId::generate(), Utc::now());
        store.create_room(room.clone()).await.unwrap();
        let binding = ChannelBinding::new(
            ChannelId::new("sms:+1"),
            room.id.clone(),
            "sms",
            crate::binding::Category::Transport,
            crate::binding::BindingDirection::Bidirectional,
            Utc::now(),
        );
        store.add_binding(binding.clone()).await.unwrap();

        for i in 0..3 {
            let event = RoomEvent::unindexed(
                room.id.clone(),
                EventType::Message,
                source(),
                Content::text(format!("msg {i}")),
                Utc::now(),
            );
            store.add_event(event).await.unwrap();
        }

        assert_eq!(store.unread_count(&binding.channel_id).await.unwrap(), 3);
        store.mark_read(&binding.channel_id, 1).await.unwrap();
        assert_eq!(store.unread_count(&binding.channel_id).await.unwrap(), 1);
    }
}
