//! `roomkit-router` — resolves an inbound message to the room it belongs
//! in, auto-creating when nothing matches.

pub mod error;
pub mod router;
pub mod types;

pub use error::{Result, RouterError};
pub use router::{InboundRouter, StoreBackedRouter};
pub use types::{RouteOutcome, RouteRequest};
