use roomkit_core::{ChannelId, ParticipantId, RoomId};

/// What the caller should do with an inbound message once routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// An existing, non-closed room the message belongs in.
    Existing(RoomId),
    /// No existing room matched — the caller materializes a new room and
    /// auto-attaches the source channel as its first binding.
    Create,
}

/// The lookup key for a `route` call — a message always carries the channel
/// it arrived on, and may optionally carry the sender's participant id if
/// one has already been established on a prior turn.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub channel_id: ChannelId,
    pub channel_type: String,
    pub participant_id: Option<ParticipantId>,
}
