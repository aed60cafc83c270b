use async_trait::async_trait;

use roomkit_core::{ChannelId, EventId, IdentityId, ParticipantId, RoomId};

use crate::binding::ChannelBinding;
use crate::error::Result;
use crate::event::RoomEvent;
use crate::identity::Identity;
use crate::observation::Observation;
use crate::participant::{Participant, ParticipantStatus};
use crate::room::Room;
use crate::task::{Task, TaskStatus};

/// Persistence contract for every entity in the data model. Implementations
/// are free to back this with anything; the only hard requirement is that
/// `add_event`, called while the caller holds the room's exclusive section,
/// assigns a gap-free monotone `index` and rejects a repeated
/// `idempotency_key` within the same room by returning the event already on
/// file rather than an error.
#[async_trait]
pub trait Store: Send + Sync {
    // Rooms
    async fn create_room(&self, room: Room) -> Result<Room>;
    async fn get_room(&self, room_id: &RoomId) -> Result<Option<Room>>;
    async fn update_room(&self, room: Room) -> Result<Room>;
    async fn delete_room(&self, room_id: &RoomId) -> Result<()>;
    async fn list_rooms(&self) -> Result<Vec<Room>>;
    async fn find_room_by_channel(&self, channel_id: &ChannelId) -> Result<Option<RoomId>>;
    async fn find_latest_room(&self, channel_type: &str, participant_id: &ParticipantId) -> Result<Option<RoomId>>;

    // Events
    /// Assigns `index = room.latest_index + 1` and persists atomically.
    /// Returns `(event, is_new)` — `is_new = false` means `event.idempotency_key`
    /// collided with an already-stored event, which is returned instead of a
    /// new insert (see invariant #2 / scenario S2).
    async fn add_event(&self, event: RoomEvent) -> Result<(RoomEvent, bool)>;
    async fn get_event(&self, event_id: &EventId) -> Result<Option<RoomEvent>>;
    async fn find_event_by_idempotency_key(
        &self,
        room_id: &RoomId,
        key: &str,
    ) -> Result<Option<RoomEvent>>;
    async fn list_events(&self, room_id: &RoomId, since_index: i64, limit: usize) -> Result<Vec<RoomEvent>>;
    async fn event_count(&self, room_id: &RoomId) -> Result<u64>;

    // Bindings
    async fn add_binding(&self, binding: ChannelBinding) -> Result<ChannelBinding>;
    async fn get_binding(&self, channel_id: &ChannelId) -> Result<Option<ChannelBinding>>;
    async fn update_binding(&self, binding: ChannelBinding) -> Result<ChannelBinding>;
    async fn remove_binding(&self, channel_id: &ChannelId) -> Result<()>;
    async fn list_bindings(&self, room_id: &RoomId) -> Result<Vec<ChannelBinding>>;

    // Participants
    async fn add_participant(&self, participant: Participant) -> Result<Participant>;
    async fn get_participant(&self, participant_id: &ParticipantId) -> Result<Option<Participant>>;
    async fn update_participant_status(
        &self,
        participant_id: &ParticipantId,
        status: ParticipantStatus,
    ) -> Result<()>;
    async fn list_participants(&self, room_id: &RoomId) -> Result<Vec<Participant>>;

    // Identities
    async fn create_identity(&self, identity: Identity) -> Result<Identity>;
    async fn get_identity(&self, identity_id: &IdentityId) -> Result<Option<Identity>>;
    async fn resolve_identity(&self, channel_type: &str, address: &str) -> Result<Option<Identity>>;
    async fn link_address(
        &self,
        identity_id: &IdentityId,
        channel_type: &str,
        address: &str,
        verified: bool,
    ) -> Result<()>;

    // Tasks
    async fn add_task(&self, task: Task) -> Result<Task>;
    async fn list_tasks(&self, room_id: &RoomId, status: Option<TaskStatus>) -> Result<Vec<Task>>;
    async fn update_task_status(&self, task_id: &roomkit_core::TaskId, status: TaskStatus) -> Result<()>;

    // Observations
    async fn add_observation(&self, observation: Observation) -> Result<Observation>;
    async fn list_observations(&self, room_id: &RoomId) -> Result<Vec<Observation>>;

    // Read tracking
    async fn mark_read(&self, channel_id: &ChannelId, up_to_index: i64) -> Result<()>;
    async fn mark_all_read(&self, room_id: &RoomId) -> Result<()>;
    async fn unread_count(&self, channel_id: &ChannelId) -> Result<u64>;
}
