use thiserror::Error;

use roomkit_core::{ChannelId, EventId, RoomId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    #[error("event not found: {0}")]
    EventNotFound(EventId),

    #[error("binding not found: {0}")]
    BindingNotFound(ChannelId),

    #[error("duplicate idempotency key in room {room_id}: {key}")]
    DuplicateIdempotencyKey { room_id: RoomId, key: String },

    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::RoomNotFound(_) => "ROOM_NOT_FOUND",
            StoreError::EventNotFound(_) => "EVENT_NOT_FOUND",
            StoreError::BindingNotFound(_) => "BINDING_NOT_FOUND",
            StoreError::DuplicateIdempotencyKey { .. } => "DUPLICATE_IDEMPOTENCY_KEY",
            StoreError::Backend(_) => "STORE_BACKEND_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
