use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use roomkit_core::RoomId;
use roomkit_store::{Direction, Observation, RoomEvent, Task};

/// The points in the inbound pipeline a hook can attach to. Both fire on
/// every processed event, including reentry events produced by intelligence
/// channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookTrigger {
    BeforeBroadcast,
    AfterBroadcast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookExecution {
    /// Runs inline, in priority order, and can block or modify the event.
    Sync,
    /// Runs concurrently as a fire-and-forget side effect.
    Async,
}

/// A sync hook's verdict. `Block` halts the remaining sync chain for this
/// trigger; `AllowModified` replaces the event seen by subsequent hooks and
/// ultimately broadcast.
#[derive(Debug, Clone)]
pub enum HookAction {
    Allow,
    AllowModified(RoomEvent),
    Block { reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct HookFilters {
    pub channel_types: Option<Vec<String>>,
    pub channel_ids: Option<Vec<roomkit_core::ChannelId>>,
    pub directions: Option<Vec<Direction>>,
}

impl HookFilters {
    fn matches(&self, event: &RoomEvent) -> bool {
        if let Some(types) = &self.channel_types {
            if !types.iter().any(|t| t == &event.source.channel_type) {
                return false;
            }
        }
        if let Some(ids) = &self.channel_ids {
            if !ids.contains(&event.source.channel_id) {
                return false;
            }
        }
        if let Some(dirs) = &self.directions {
            if !dirs.contains(&event.source.direction) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookScope {
    Global,
    Room(RoomId),
}

#[derive(Debug, Clone)]
pub struct HookContext {
    pub event: RoomEvent,
    pub trigger: HookTrigger,
    pub timestamp: DateTime<Utc>,
}

impl HookContext {
    pub fn new(event: RoomEvent, trigger: HookTrigger) -> Self {
        Self {
            event,
            trigger,
            timestamp: Utc::now(),
        }
    }
}

/// Side effects a hook may produce alongside its verdict — persisted after
/// the pipeline decides the event itself is allowed through.
#[derive(Debug, Clone, Default)]
pub struct HookSideEffects {
    pub injected_events: Vec<RoomEvent>,
    pub tasks: Vec<Task>,
    pub observations: Vec<Observation>,
}

#[derive(Debug, Clone)]
pub struct HookOutcome {
    pub action: HookAction,
    pub side_effects: HookSideEffects,
}

impl HookOutcome {
    pub fn allow() -> Self {
        Self {
            action: HookAction::Allow,
            side_effects: HookSideEffects::default(),
        }
    }

    pub fn block(reason: impl Into<String>) -> Self {
        Self {
            action: HookAction::Block {
                reason: reason.into(),
            },
            side_effects: HookSideEffects::default(),
        }
    }

    pub fn modified(event: RoomEvent) -> Self {
        Self {
            action: HookAction::AllowModified(event),
            side_effects: HookSideEffects::default(),
        }
    }
}

#[async_trait]
pub trait HookHandler: Send + Sync {
    async fn handle(&self, ctx: &HookContext) -> HookOutcome;
}

#[derive(Clone)]
pub struct HookDefinition {
    pub name: String,
    pub trigger: HookTrigger,
    pub execution: HookExecution,
    pub handler: Arc<dyn HookHandler>,
    pub priority: i32,
    pub filters: HookFilters,
    pub scope: HookScope,
    pub timeout: Duration,
}

impl HookDefinition {
    pub fn new(
        name: impl Into<String>,
        trigger: HookTrigger,
        execution: HookExecution,
        handler: Arc<dyn HookHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            trigger,
            execution,
            handler,
            priority: 100,
            filters: HookFilters::default(),
            scope: HookScope::Global,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_filters(mut self, filters: HookFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_scope(mut self, scope: HookScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn matches(&self, room_id: &RoomId, trigger: HookTrigger, event: &RoomEvent) -> bool {
        if self.trigger != trigger {
            return false;
        }
        match &self.scope {
            HookScope::Global => {}
            HookScope::Room(r) => {
                if r != room_id {
                    return false;
                }
            }
        }
        self.filters.matches(event)
    }
}
