//! `roomkit-core` — shared primitives for the roomkit conversation
//! orchestrator: entity ids, configuration, the error base, framework-event
//! emission, and the cancellation/timeout helpers every other `roomkit-*`
//! crate builds on.

pub mod cancel;
pub mod config;
pub mod error;
pub mod framework_event;
pub mod ids;

pub use cancel::{run_bounded, CancellationToken, Outcome};
pub use config::RoomkitConfig;
pub use error::{CoreError, Result};
pub use framework_event::{FrameworkEvent, FrameworkEventBus, FrameworkEventName, FrameworkEventSink};
pub use ids::{ChannelId, EventId, IdentityId, ObservationId, ParticipantId, RoomId, SubscriptionId, TaskId};
