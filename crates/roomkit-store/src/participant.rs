use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use roomkit_core::{ChannelId, IdentityId, ParticipantId, RoomId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Owner,
    Member,
    Observer,
    Bot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Active,
    Left,
    Removed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub room_id: RoomId,
    pub channel_id: ChannelId,
    pub role: ParticipantRole,
    pub status: ParticipantStatus,
    pub identity_id: Option<IdentityId>,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Participant {
    pub fn new(
        room_id: RoomId,
        channel_id: ChannelId,
        role: ParticipantRole,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ParticipantId::generate(),
            room_id,
            channel_id,
            role,
            status: ParticipantStatus::Active,
            identity_id: None,
            joined_at: now,
            updated_at: now,
        }
    }
}
