use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use roomkit_store::{Content, Task, Observation, RoomEvent};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    Connected,
    Connecting,
    Disconnected,
    Error(String),
}

/// A raw message as an adapter received it from its external provider,
/// before [`crate::channel::Channel::handle_inbound`] turns it into a
/// canonical [`RoomEvent`].
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub content: Content,
    pub external_id: Option<String>,
    pub external_sender_address: Option<String>,
    pub received_at: DateTime<Utc>,
}

/// What [`crate::channel::Channel::on_event`] may hand back after reacting
/// to a broadcast event — reentry events plus any side records.
#[derive(Debug, Clone, Default)]
pub struct ChannelEventOutcome {
    pub response_events: Vec<RoomEvent>,
    pub tasks: Vec<Task>,
    pub observations: Vec<Observation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed,
}
