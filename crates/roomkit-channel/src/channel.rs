use async_trait::async_trait;

use roomkit_store::{Category, ChannelBinding, Capabilities, RoomEvent};

use crate::error::Result;
use crate::types::{ChannelEventOutcome, ChannelStatus, InboundMessage};

/// Context a channel needs while reacting to inbound messages or broadcast
/// events — deliberately thin; the adapter is expected to hold its own
/// provider connection and any state it needs beyond this.
pub struct RoomContext {
    pub room_id: roomkit_core::RoomId,
    pub binding: ChannelBinding,
}

/// Adapter contract every external endpoint plugs into. Concrete adapters
/// (SMS, email, a specific AI provider, ...) are out of this crate's scope —
/// this trait is the seam they implement against. Lifecycle methods take
/// `&self`, not `&mut self`: adapters live behind `Arc<dyn Channel>` in
/// [`crate::registry::ChannelRegistry`] for concurrent broadcast fan-out, so
/// any provider connection state they manage across `connect`/`disconnect`/
/// `close` must be behind its own internal synchronization, the same as
/// every other shared-state collaborator in this workspace (the circuit
/// breaker, the rate limiter, the lock registry).
#[async_trait]
pub trait Channel: Send + Sync {
    fn channel_type(&self) -> &str;
    fn category(&self) -> Category;
    fn capabilities(&self) -> Capabilities;

    async fn connect(&self) -> Result<()>;
    async fn disconnect(&self) -> Result<()>;
    fn status(&self) -> ChannelStatus;

    /// Converts a raw provider message into the canonical event shape. Transport
    /// adapters call this from their own ingestion loop (outside this crate);
    /// the inbound pipeline receives the already-converted event.
    async fn handle_inbound(&self, message: InboundMessage, ctx: &RoomContext) -> Result<RoomEvent>;

    /// Transport-only: pushes `event` to the external endpoint.
    async fn deliver(&self, event: &RoomEvent, ctx: &RoomContext) -> Result<()>;

    /// Called for every broadcast target, transport and intelligence alike.
    /// The default no-op fits transports; intelligence adapters override
    /// this to produce response events.
    async fn on_event(&self, event: &RoomEvent, ctx: &RoomContext) -> Result<ChannelEventOutcome> {
        let _ = (event, ctx);
        Ok(ChannelEventOutcome::default())
    }

    async fn close(&self) -> Result<()> {
        self.disconnect().await
    }
}
