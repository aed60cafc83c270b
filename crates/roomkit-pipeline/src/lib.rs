//! `roomkit-pipeline` — the inbound orchestrator and event router: the two
//! components every other `roomkit-*` crate exists to serve. Routes an
//! inbound message to its room, runs identity resolution and the hook
//! middleware under the room's exclusive section, broadcasts to eligible
//! bindings with transcoding and per-channel resilience, and drains
//! intelligence-channel reentry within bounded depth.

pub mod broadcast;
pub mod builder;
pub mod error;
pub mod pipeline;
pub mod types;

pub use broadcast::EventRouter;
pub use builder::RoomkitBuilder;
pub use error::{PipelineError, Result};
pub use pipeline::InboundPipeline;
pub use types::{BroadcastOutcome, DeliveryResult, DeliveryResultKind, ProcessInboundOutcome};
