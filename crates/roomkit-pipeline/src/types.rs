use roomkit_core::{ChannelId, EventId};
use roomkit_hooks::HookError;
use roomkit_store::{Observation, RoomEvent, Task};

/// What happened for one binding during a single broadcast pass.
#[derive(Debug, Clone)]
pub enum DeliveryResultKind {
    Delivered,
    Skipped { reason: String },
    TranscodingFailed,
    CircuitOpen,
    Failed { error: String },
}

#[derive(Debug, Clone)]
pub struct DeliveryResult {
    pub channel_id: ChannelId,
    pub event_id: EventId,
    pub kind: DeliveryResultKind,
}

impl DeliveryResult {
    pub fn new(channel_id: ChannelId, event_id: EventId, kind: DeliveryResultKind) -> Self {
        Self {
            channel_id,
            event_id,
            kind,
        }
    }
}

/// Everything one `broadcast()` pass produced: per-binding delivery results,
/// reentry events admitted under `max_chain_depth` (events that exceeded it
/// were already persisted as blocked by the router), and accumulated
/// side-effect records from every target's `on_event`.
#[derive(Debug, Default)]
pub struct BroadcastOutcome {
    pub delivery_results: Vec<DeliveryResult>,
    pub reentry_queue: Vec<RoomEvent>,
    pub tasks: Vec<Task>,
    pub observations: Vec<Observation>,
}

impl BroadcastOutcome {
    pub fn merge(&mut self, other: BroadcastOutcome) {
        self.delivery_results.extend(other.delivery_results);
        self.reentry_queue.extend(other.reentry_queue);
        self.tasks.extend(other.tasks);
        self.observations.extend(other.observations);
    }
}

/// The structured result `process_inbound` hands back to the caller, per
/// the error-handling design's "user-visible failure behavior."
#[derive(Debug)]
pub struct ProcessInboundOutcome {
    pub event: Option<RoomEvent>,
    pub blocked: bool,
    pub blocked_reason: Option<String>,
    pub hook_errors: Vec<HookError>,
    pub delivery_results: Vec<DeliveryResult>,
}

impl ProcessInboundOutcome {
    pub fn blocked(event: RoomEvent, reason: impl Into<String>) -> Self {
        Self {
            event: Some(event),
            blocked: true,
            blocked_reason: Some(reason.into()),
            hook_errors: Vec::new(),
            delivery_results: Vec::new(),
        }
    }
}
