use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{ChannelId, RoomId};

/// Names of the internal transitions the pipeline reports for observability.
/// Distinct from [`crate::ids`]-addressed domain events — these are never
/// persisted, only emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameworkEventName {
    RoomCreated,
    RoomClosed,
    EventBlocked,
    DeliverySucceeded,
    DeliveryFailed,
    BroadcastPartialFailure,
    ChainDepthExceeded,
    IdentityTimeout,
    ProcessTimeout,
    HookError,
    TranscodingFailed,
}

impl FrameworkEventName {
    /// `tracing` level this event is emitted at when no handler is
    /// registered for it. Failure-shaped names are loud by default; routine
    /// lifecycle names stay at `info`.
    pub fn tracing_level(&self) -> tracing::Level {
        use tracing::Level;
        match self {
            FrameworkEventName::DeliveryFailed
            | FrameworkEventName::ProcessTimeout
            | FrameworkEventName::HookError
            | FrameworkEventName::ChainDepthExceeded => Level::WARN,
            FrameworkEventName::RoomCreated | FrameworkEventName::RoomClosed => Level::INFO,
            _ => Level::DEBUG,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FrameworkEventName::RoomCreated => "room_created",
            FrameworkEventName::RoomClosed => "room_closed",
            FrameworkEventName::EventBlocked => "event_blocked",
            FrameworkEventName::DeliverySucceeded => "delivery_succeeded",
            FrameworkEventName::DeliveryFailed => "delivery_failed",
            FrameworkEventName::BroadcastPartialFailure => "broadcast_partial_failure",
            FrameworkEventName::ChainDepthExceeded => "chain_depth_exceeded",
            FrameworkEventName::IdentityTimeout => "identity_timeout",
            FrameworkEventName::ProcessTimeout => "process_timeout",
            FrameworkEventName::HookError => "hook_error",
            FrameworkEventName::TranscodingFailed => "transcoding_failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameworkEvent {
    pub name: FrameworkEventName,
    pub room_id: Option<RoomId>,
    pub channel_id: Option<ChannelId>,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl FrameworkEvent {
    pub fn new(name: FrameworkEventName, timestamp: DateTime<Utc>) -> Self {
        Self {
            name,
            room_id: None,
            channel_id: None,
            data: Value::Null,
            timestamp,
        }
    }

    pub fn with_room(mut self, room_id: RoomId) -> Self {
        self.room_id = Some(room_id);
        self
    }

    pub fn with_channel(mut self, channel_id: ChannelId) -> Self {
        self.channel_id = Some(channel_id);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

/// Fire-and-forget sink for framework events. Implementors must not block the
/// caller for long — the pipeline does not await delivery guarantees here.
pub trait FrameworkEventSink: Send + Sync {
    fn emit(&self, event: FrameworkEvent);
}

/// Default sink: every event becomes a `tracing` event at the level named in
/// [`FrameworkEventName::tracing_level`], so a host with only a `tracing`
/// subscriber configured still observes every transition.
#[derive(Debug, Default)]
pub struct TracingSink;

impl FrameworkEventSink for TracingSink {
    fn emit(&self, event: FrameworkEvent) {
        let name = event.name.as_str();
        let room_id = event.room_id.as_ref().map(|r| r.as_str().to_string());
        let channel_id = event.channel_id.as_ref().map(|c| c.as_str().to_string());
        match event.name.tracing_level() {
            tracing::Level::ERROR => {
                tracing::error!(name, ?room_id, ?channel_id, data = %event.data, "framework event")
            }
            tracing::Level::WARN => {
                tracing::warn!(name, ?room_id, ?channel_id, data = %event.data, "framework event")
            }
            tracing::Level::INFO => {
                tracing::info!(name, ?room_id, ?channel_id, data = %event.data, "framework event")
            }
            _ => {
                tracing::debug!(name, ?room_id, ?channel_id, data = %event.data, "framework event")
            }
        }
    }
}

/// Fan-out sink that forwards to a `tracing`-backed sink plus any number of
/// host-registered named handlers. Handlers are invoked best-effort; a
/// handler that panics or blocks past its timeout does not affect the
/// pipeline (the pipeline schedules handler invocation off the hot path).
pub struct FrameworkEventBus {
    handlers: Vec<Box<dyn FrameworkEventSink>>,
}

impl Default for FrameworkEventBus {
    fn default() -> Self {
        Self {
            handlers: vec![Box::new(TracingSink)],
        }
    }
}

impl FrameworkEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, sink: Box<dyn FrameworkEventSink>) {
        self.handlers.push(sink);
    }

    pub fn emit(&self, event: FrameworkEvent) {
        for handler in &self.handlers {
            handler.emit(event.clone());
        }
    }
}
