//! `roomkit-hooks` — the middleware pipeline: sync block/allow/modify hooks
//! and async fire-and-forget hooks, registered globally or per room.

pub mod engine;
pub mod error;
pub mod types;

pub use engine::{HookEngine, SyncPipelineResult};
pub use error::{HookError, Result};
pub use types::{
    HookAction, HookContext, HookDefinition, HookExecution, HookFilters, HookHandler, HookOutcome,
    HookScope, HookSideEffects, HookTrigger,
};
