use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use roomkit_core::{RoomId, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub room_id: RoomId,
    pub kind: String,
    pub payload: Value,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(room_id: RoomId, kind: impl Into<String>, payload: Value, now: DateTime<Utc>) -> Self {
        Self {
            id: TaskId::generate(),
            room_id,
            kind: kind.into(),
            payload,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}
