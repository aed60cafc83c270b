//! `roomkit-channel` — the adapter contract ([`Channel`]) that concrete
//! transport/intelligence integrations implement against. Concrete adapters
//! are out of scope for this crate.

pub mod channel;
pub mod error;
pub mod registry;
pub mod types;

pub use channel::{Channel, RoomContext};
pub use error::{ChannelError, Result};
pub use registry::ChannelRegistry;
pub use types::{ChannelEventOutcome, ChannelStatus, DeliveryOutcome, InboundMessage};
