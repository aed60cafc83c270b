//! `roomkit-realtime` — ephemeral, unpersisted pub/sub for typing,
//! presence, and read-receipt events, scoped per room.

pub mod bus;
pub mod types;

pub use bus::{RealtimeBus, RealtimeBusConfig};
pub use types::{EphemeralEvent, EphemeralEventType, RealtimeItem};
