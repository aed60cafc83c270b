use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use roomkit_core::{ChannelId, EventId, ParticipantId, RoomId};

use crate::content::Content;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Message,
    System,
    Typing,
    ReadReceipt,
    DeliveryReceipt,
    Presence,
    Reaction,
    Edit,
    Delete,
    ParticipantJoined,
    ParticipantLeft,
    ChannelAttached,
    ChannelDetached,
    TaskCreated,
    Observation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSource {
    pub channel_id: ChannelId,
    pub channel_type: String,
    pub direction: Direction,
    pub participant_id: Option<ParticipantId>,
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Pending,
    Delivered,
    Read,
    Failed,
    Blocked,
}

/// Who may see an event downstream of the originating binding. `Channels`
/// holds an explicit allow-set; the router treats it as the general case and
/// `All`/`None`/`Category` as shorthands for the common ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Visibility {
    All,
    None,
    Transport,
    Intelligence,
    Channels { ids: Vec<ChannelId> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomEvent {
    pub id: EventId,
    pub room_id: RoomId,
    pub event_type: EventType,
    pub source: EventSource,
    pub content: Content,
    pub status: EventStatus,
    pub blocked_by: Option<String>,
    pub visibility: Visibility,
    pub index: i64,
    pub chain_depth: u32,
    pub parent_event_id: Option<EventId>,
    pub correlation_id: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub metadata: Value,
}

impl RoomEvent {
    /// Builds an event not yet assigned a room index — the store assigns
    /// `index` atomically when the event is added under the room's section.
    pub fn unindexed(
        room_id: RoomId,
        event_type: EventType,
        source: EventSource,
        content: Content,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EventId::generate(),
            room_id,
            event_type,
            source,
            content,
            status: EventStatus::Pending,
            blocked_by: None,
            visibility: Visibility::All,
            index: -1,
            chain_depth: 0,
            parent_event_id: None,
            correlation_id: None,
            idempotency_key: None,
            created_at: now,
            metadata: Value::Null,
        }
    }

    pub fn mark_blocked(&mut self, by: impl Into<String>) {
        self.status = EventStatus::Blocked;
        self.blocked_by = Some(by.into());
    }
}
