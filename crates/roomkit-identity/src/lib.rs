//! `roomkit-identity` — resolves the sender of an inbound event to a stored
//! identity, with a timeout budget and hook-driven escalation for
//! ambiguous/unknown senders.

pub mod error;
pub mod pipeline;
pub mod resolver;
pub mod types;

pub use error::{IdentityError, Result};
pub use pipeline::{IdentityOutcome, IdentityPipeline};
pub use resolver::{CachingIdentityResolver, IdentityResolver};
pub use types::{
    IdentityHookAction, IdentityHookContext, IdentityHookHandler, IdentityResolution, ResolveOutcome,
};
