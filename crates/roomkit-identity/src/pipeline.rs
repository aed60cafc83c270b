use std::sync::Arc;
use std::time::Duration;

use roomkit_core::{CancellationToken, Outcome};
use roomkit_store::RoomEvent;

use crate::resolver::IdentityResolver;
use crate::types::{IdentityHookAction, IdentityHookContext, IdentityHookHandler, IdentityResolution, ResolveOutcome};

pub struct IdentityOutcome {
    pub resolution: IdentityResolution,
    pub injected_event: Option<RoomEvent>,
    /// Set when the resolver was cut off by `identity_timeout` — the
    /// orchestrator is expected to emit `identity_timeout` for this case.
    pub timed_out: bool,
}

impl IdentityOutcome {
    fn simple(resolution: IdentityResolution) -> Self {
        Self {
            resolution,
            injected_event: None,
            timed_out: false,
        }
    }
}

/// Runs the resolver under a timeout budget, then — for `Ambiguous` and
/// `NotFound` outcomes — gives registered identity hooks a chance to
/// escalate to a final resolution.
pub struct IdentityPipeline {
    resolver: Arc<dyn IdentityResolver>,
    hooks: Vec<Arc<dyn IdentityHookHandler>>,
    timeout: Duration,
    /// When set, only events from these channel types go through identity
    /// resolution at all; others return [`IdentityResolution::Skipped`].
    channel_allow_list: Option<Vec<String>>,
}

impl IdentityPipeline {
    pub fn new(resolver: Arc<dyn IdentityResolver>, timeout: Duration) -> Self {
        Self {
            resolver,
            hooks: Vec::new(),
            timeout,
            channel_allow_list: None,
        }
    }

    pub fn with_channel_allow_list(mut self, allow_list: Vec<String>) -> Self {
        self.channel_allow_list = Some(allow_list);
        self
    }

    pub fn register_hook(&mut self, hook: Arc<dyn IdentityHookHandler>) {
        self.hooks.push(hook);
    }

    pub async fn run(&self, event: &RoomEvent, cancel: &CancellationToken) -> IdentityOutcome {
        if let Some(allow_list) = &self.channel_allow_list {
            if !allow_list.iter().any(|t| t == &event.source.channel_type) {
                return IdentityOutcome::simple(IdentityResolution::Skipped);
            }
        }

        let channel_type = event.source.channel_type.clone();
        let address = event
            .source
            .external_id
            .clone()
            .unwrap_or_else(|| event.source.channel_id.to_string());

        let resolve_fut = self.resolver.resolve(&channel_type, &address);
        let outcome = match roomkit_core::run_bounded(resolve_fut, self.timeout, cancel).await {
            Outcome::Completed(Ok(resolved)) => resolved,
            Outcome::Completed(Err(e)) => {
                tracing::warn!(error = %e, "identity resolver returned an error, degrading to unknown");
                ResolveOutcome::NotFound
            }
            Outcome::TimedOut => {
                return IdentityOutcome {
                    resolution: IdentityResolution::Unknown,
                    injected_event: None,
                    timed_out: true,
                };
            }
            Outcome::Cancelled => {
                return IdentityOutcome {
                    resolution: IdentityResolution::Unknown,
                    injected_event: None,
                    timed_out: false,
                };
            }
        };

        match outcome {
            ResolveOutcome::Found(identity_id) => {
                IdentityOutcome::simple(IdentityResolution::Identified(identity_id))
            }
            ResolveOutcome::Ambiguous(candidates) => {
                self.escalate(event, &channel_type, candidates, IdentityResolution::Ambiguous)
                    .await
            }
            ResolveOutcome::NotFound => {
                self.escalate(event, &channel_type, Vec::new(), IdentityResolution::Unknown)
                    .await
            }
        }
    }

    async fn escalate(
        &self,
        event: &RoomEvent,
        channel_type: &str,
        candidates: Vec<roomkit_core::IdentityId>,
        default: IdentityResolution,
    ) -> IdentityOutcome {
        let ctx = IdentityHookContext {
            event: event.clone(),
            channel_type: channel_type.to_string(),
            candidates,
        };
        for hook in &self.hooks {
            if let Some(action) = hook.handle(&ctx).await {
                return match action {
                    IdentityHookAction::Resolved(id) => {
                        IdentityOutcome::simple(IdentityResolution::Identified(id))
                    }
                    IdentityHookAction::Pending => IdentityOutcome::simple(IdentityResolution::Pending),
                    IdentityHookAction::Challenge { challenge_event } => IdentityOutcome {
                        resolution: IdentityResolution::ChallengeSent,
                        injected_event: Some(challenge_event),
                        timed_out: false,
                    },
                    IdentityHookAction::Reject { reason } => {
                        IdentityOutcome::simple(IdentityResolution::Rejected { reason })
                    }
                };
            }
        }
        IdentityOutcome::simple(default)
    }
}
