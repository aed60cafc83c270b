use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("room is closed and cannot accept new inbound events")]
    RoomClosed,

    #[error("no room resolved and auto-create is disabled")]
    RoutingFailed,

    #[error("store error: {0}")]
    Store(#[from] roomkit_store::StoreError),
}

impl RouterError {
    pub fn code(&self) -> &'static str {
        match self {
            RouterError::RoomClosed => "ROOM_CLOSED",
            RouterError::RoutingFailed => "ROUTING_FAILED",
            RouterError::Store(_) => "STORE_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, RouterError>;
