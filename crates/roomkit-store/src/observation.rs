use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use roomkit_core::{EventId, ObservationId, RoomId};

/// A side-effect record produced by a hook or an intelligence channel and
/// persisted alongside (not instead of) a [`crate::event::RoomEvent`] —
/// e.g. the paired record created when a reentry event is blocked for
/// exceeding `max_chain_depth`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub id: ObservationId,
    pub room_id: RoomId,
    pub related_event_id: Option<EventId>,
    pub kind: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
}

impl Observation {
    pub fn new(room_id: RoomId, kind: impl Into<String>, data: Value, now: DateTime<Utc>) -> Self {
        Self {
            id: ObservationId::generate(),
            room_id,
            related_event_id: None,
            kind: kind.into(),
            data,
            created_at: now,
        }
    }

    pub fn for_event(mut self, event_id: EventId) -> Self {
        self.related_event_id = Some(event_id);
        self
    }
}
