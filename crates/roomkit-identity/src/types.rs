use async_trait::async_trait;

use roomkit_core::IdentityId;
use roomkit_store::RoomEvent;

/// Raw verdict from an [`crate::resolver::IdentityResolver`] lookup, before
/// any identity hook gets a chance to escalate it.
#[derive(Debug, Clone)]
pub enum ResolveOutcome {
    Found(IdentityId),
    /// More than one identity plausibly matches the inbound address.
    Ambiguous(Vec<IdentityId>),
    NotFound,
}

/// The pipeline-visible result of running identity resolution for an
/// inbound event, after hook escalation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityResolution {
    Identified(IdentityId),
    Pending,
    Ambiguous,
    Unknown,
    ChallengeSent,
    Rejected { reason: String },
    /// The event's channel type is outside the configured allow-list —
    /// identity resolution was never attempted.
    Skipped,
}

/// What an identity hook may decide when the raw resolution came back
/// `Ambiguous` or `NotFound`.
#[derive(Debug, Clone)]
pub enum IdentityHookAction {
    Resolved(IdentityId),
    Pending,
    /// Injects `challenge_event` back to the sender and blocks the original.
    Challenge { challenge_event: RoomEvent },
    Reject { reason: String },
}

#[derive(Debug, Clone)]
pub struct IdentityHookContext {
    pub event: RoomEvent,
    pub channel_type: String,
    pub candidates: Vec<IdentityId>,
}

#[async_trait]
pub trait IdentityHookHandler: Send + Sync {
    async fn handle(&self, ctx: &IdentityHookContext) -> Option<IdentityHookAction>;
}
