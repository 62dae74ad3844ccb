use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::decision::Decision;
use super::effect::{Effect, EffectApplier};
use super::events::EventPayload;
use super::executor::ExecutorSet;
use super::merger::merge;
use super::payload::PayloadBuilder;
use super::resolver::MatcherResolver;
use super::result::HookResult;
use super::scheduler::Scheduler;
use crate::config::HookSnapshot;

/// Outcome of evaluating one event occurrence
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub decision: Decision,
    /// Raw results in declared order, for diagnostics
    pub results: Vec<HookResult>,
}

/// Resolves, runs, and merges the hooks for each event occurrence against
/// one session snapshot.
pub struct HookEngine {
    snapshot: Arc<HookSnapshot>,
    resolver: MatcherResolver,
    scheduler: Scheduler,
    applier: EffectApplier,
}

impl HookEngine {
    pub fn new(snapshot: Arc<HookSnapshot>, executors: ExecutorSet) -> Self {
        Self {
            resolver: MatcherResolver::new(snapshot.clone()),
            scheduler: Scheduler::new(executors),
            applier: EffectApplier::default(),
            snapshot,
        }
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.scheduler = self.scheduler.with_max_parallel(max_parallel);
        self
    }

    pub fn with_applier(mut self, applier: EffectApplier) -> Self {
        self.applier = applier;
        self
    }

    pub fn snapshot(&self) -> &Arc<HookSnapshot> {
        &self.snapshot
    }

    pub async fn evaluate(&self, builder: PayloadBuilder) -> Decision {
        self.evaluate_with_cancel(builder, CancellationToken::new())
            .await
            .decision
    }

    /// Build the payload and evaluate it. A payload that cannot be built
    /// runs no hooks and yields the permissive Decision.
    pub async fn evaluate_with_cancel(
        &self,
        builder: PayloadBuilder,
        cancel: CancellationToken,
    ) -> Evaluation {
        let event = builder.event();
        match builder.build() {
            Ok(payload) => self.evaluate_payload(Arc::new(payload), cancel).await,
            Err(e) => {
                warn!(event = %event, error = %e, "Cannot build event payload, skipping hooks");
                Evaluation {
                    decision: Decision::permissive(event),
                    results: Vec::new(),
                }
            }
        }
    }

    /// Run every matching hook and merge the results. Waits for all of them;
    /// cancelling `cancel` (or dropping this future) stops in-flight hooks.
    pub async fn evaluate_payload(
        &self,
        payload: Arc<EventPayload>,
        cancel: CancellationToken,
    ) -> Evaluation {
        let started = Instant::now();
        let event = payload.event();
        let groups = self.resolver.resolve(event, &payload);
        if groups.is_empty() {
            return Evaluation {
                decision: Decision::permissive(event),
                results: Vec::new(),
            };
        }

        let cancel = cancel.child_token();
        let _guard = cancel.clone().drop_guard();
        let results = self.scheduler.run(groups, payload, cancel).await;
        let decision = merge(event, &results);

        info!(
            event = %event,
            decision = %decision.id,
            hooks = results.len(),
            blocking = decision.is_blocking(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Hook event evaluated"
        );
        Evaluation { decision, results }
    }

    /// Apply a Decision's effect; a second application is a no-op
    pub fn apply(&self, decision: &Decision) -> Effect {
        self.applier.apply(decision)
    }
}
