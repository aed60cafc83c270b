use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use roomkit_core::{ChannelId, RoomId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EphemeralEventType {
    TypingStart,
    TypingStop,
    PresenceOnline,
    PresenceAway,
    PresenceOffline,
    ReadReceipt,
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EphemeralEvent {
    pub room_id: RoomId,
    pub event_type: EphemeralEventType,
    pub user_id: Option<String>,
    pub channel_id: Option<ChannelId>,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl EphemeralEvent {
    pub fn new(room_id: RoomId, event_type: EphemeralEventType, timestamp: DateTime<Utc>) -> Self {
        Self {
            room_id,
            event_type,
            user_id: None,
            channel_id: None,
            data: Value::Null,
            timestamp,
        }
    }
}

/// What a subscriber's channel actually carries — either a published event
/// or a coalesced notice that some number of events were dropped because the
/// subscriber's queue was full.
#[derive(Debug, Clone)]
pub enum RealtimeItem {
    Event(EphemeralEvent),
    Lagged { dropped: u64 },
}
