use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use roomkit_core::RoomId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Active,
    Paused,
    Closed,
    Archived,
}

/// Inactivity/closure windows for [`crate::room::check_timers`]. `None`
/// disables the corresponding transition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomTimers {
    pub inactive_after_secs: Option<i64>,
    pub closed_after_secs: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub organization_id: Option<String>,
    pub status: RoomStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub timers: RoomTimers,
    pub metadata: Value,
    pub event_count: u64,
    pub latest_index: i64,
}

impl Room {
    pub fn new(id: RoomId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            organization_id: None,
            status: RoomStatus::Active,
            created_at: now,
            updated_at: now,
            closed_at: None,
            timers: RoomTimers::default(),
            metadata: Value::Null,
            event_count: 0,
            latest_index: -1,
        }
    }
}

/// Pure function evaluating a room's timers against `now`, per the
/// "global timers modeled as a pure function, driven by an external ticker"
/// design note — never called from inside the inbound pipeline itself.
pub fn check_timers(room: &Room, now: DateTime<Utc>) -> Option<RoomStatus> {
    if room.status != RoomStatus::Active {
        return None;
    }
    let idle_secs = (now - room.updated_at).num_seconds();
    if let Some(closed_after) = room.timers.closed_after_secs {
        if idle_secs >= closed_after {
            return Some(RoomStatus::Closed);
        }
    }
    if let Some(inactive_after) = room.timers.inactive_after_secs {
        if idle_secs >= inactive_after {
            return Some(RoomStatus::Paused);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn active_room_with_no_timers_never_transitions() {
        let room = Room::new(RoomId::generate(), Utc::now());
        assert_eq!(check_timers(&room, Utc::now() + Duration::days(365)), None);
    }

    #[test]
    fn inactive_after_pauses_an_idle_room() {
        let mut room = Room::new(RoomId::generate(), Utc::now());
        room.timers.inactive_after_secs = Some(60);
        let later = room.updated_at + Duration::seconds(61);
        assert_eq!(check_timers(&room, later), Some(RoomStatus::Paused));
    }

    #[test]
    fn closed_after_takes_priority_over_inactive_after() {
        let mut room = Room::new(RoomId::generate(), Utc::now());
        room.timers.inactive_after_secs = Some(60);
        room.timers.closed_after_secs = Some(120);
        let later = room.updated_at + Duration::seconds(121);
        assert_eq!(check_timers(&room, later), Some(RoomStatus::Closed));
    }

    #[test]
    fn non_active_room_never_transitions() {
        let mut room = Room::new(RoomId::generate(), Utc::now());
        room.status = RoomStatus::Closed;
        room.timers.inactive_after_secs = Some(1);
        let later = room.updated_at + Duration::seconds(1000);
        assert_eq!(check_timers(&room, later), None);
    }
}
