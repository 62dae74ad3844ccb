use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::decision::{Decision, PermissionDecision};
use super::events::HookEventName;

/// One concrete effect on the host agent loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum EffectAction {
    /// Stop the whole session; the reason is for the user
    HaltSession { reason: String },
    ProceedWithTool,
    /// PreToolUse deny: cancel the pending call and tell the agent why
    AbortToolCall { reason: String },
    /// PreToolUse ask: hold the call for user confirmation
    AskUser { reason: String },
    /// PostToolUse block: the agent re-processes the completed tool call
    FeedbackToAgent { reason: String },
    /// UserPromptSubmit block: drop the prompt, show the reason to the user only
    ErasePrompt { reason: String },
    /// Stop/SubagentStop block: keep the loop running with this instruction
    PreventStop { reason: String },
    InjectContext { context: String },
    ShowUser { message: String },
    Transcript { output: String },
}

/// The effect implied by one Decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    pub decision_id: Uuid,
    pub event: HookEventName,
    pub actions: Vec<EffectAction>,
}

impl Effect {
    pub fn blocks(&self) -> bool {
        self.actions.iter().any(|a| {
            matches!(
                a,
                EffectAction::HaltSession { .. }
                    | EffectAction::AbortToolCall { .. }
                    | EffectAction::AskUser { .. }
                    | EffectAction::ErasePrompt { .. }
                    | EffectAction::PreventStop { .. }
            )
        })
    }
}

/// Compute the effect of a Decision. Pure: same Decision, same actions.
pub fn plan(decision: &Decision) -> Effect {
    let mut actions = Vec::new();

    if !decision.continue_session {
        actions.push(EffectAction::HaltSession {
            reason: decision.stop_reason.clone().unwrap_or_default(),
        });
        push_user_messages(decision, &mut actions);
        return Effect {
            decision_id: decision.id,
            event: decision.event,
            actions,
        };
    }

    let reason = decision.reason.clone().unwrap_or_default();
    match decision.event {
        HookEventName::PreToolUse => {
            let reason = decision.permission_decision_reason.clone().unwrap_or_default();
            actions.push(match decision.permission_decision {
                Some(PermissionDecision::Deny) => EffectAction::AbortToolCall { reason },
                Some(PermissionDecision::Ask) => EffectAction::AskUser { reason },
                Some(PermissionDecision::Allow) | None => EffectAction::ProceedWithTool,
            });
        }
        HookEventName::PostToolUse if decision.block_decision.is_some() => {
            actions.push(EffectAction::FeedbackToAgent { reason });
        }
        HookEventName::UserPromptSubmit if decision.block_decision.is_some() => {
            actions.push(EffectAction::ErasePrompt { reason });
        }
        HookEventName::Stop | HookEventName::SubagentStop if decision.block_decision.is_some() => {
            actions.push(EffectAction::PreventStop { reason });
        }
        _ => {}
    }

    let blocked = decision.block_decision.is_some();
    if let Some(context) = &decision.additional_context {
        if decision.event.stdout_is_context() && !blocked {
            actions.push(EffectAction::InjectContext {
                context: context.clone(),
            });
        }
    }

    push_user_messages(decision, &mut actions);

    if !decision.suppress_output {
        actions.extend(decision.transcript.iter().map(|output| EffectAction::Transcript {
            output: output.clone(),
        }));
    }

    Effect {
        decision_id: decision.id,
        event: decision.event,
        actions,
    }
}

fn push_user_messages(decision: &Decision, actions: &mut Vec<EffectAction>) {
    if let Some(message) = &decision.system_message {
        actions.push(EffectAction::ShowUser {
            message: message.clone(),
        });
    }
    actions.extend(decision.user_notices.iter().map(|notice| EffectAction::ShowUser {
        message: notice.clone(),
    }));
}

/// Host agent loop side of effect application
pub trait EffectSink: Send + Sync {
    fn perform(&self, action: &EffectAction);
}

/// Sink that discards actions, for callers that only need the plan
pub struct NoopSink;

impl EffectSink for NoopSink {
    fn perform(&self, _action: &EffectAction) {}
}

/// Applied Decisions remembered for idempotency before the oldest is evicted
pub const DEFAULT_APPLIED_CAPACITY: usize = 256;

/// Applies Decisions to a sink at most once per Decision id.
///
/// Only the most recent `capacity` Decisions are remembered, so memory stays
/// bounded over a long session.
pub struct EffectApplier {
    sink: Arc<dyn EffectSink>,
    applied: DashMap<Uuid, Effect>,
    order: Mutex<VecDeque<Uuid>>,
    capacity: usize,
}

impl EffectApplier {
    pub fn new(sink: Arc<dyn EffectSink>) -> Self {
        Self {
            sink,
            applied: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            capacity: DEFAULT_APPLIED_CAPACITY,
        }
    }

    /// Remember at most `capacity` applied Decisions (minimum 1)
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Perform the Decision's effect. Re-applying a Decision returns the
    /// recorded effect without touching the sink again.
    pub fn apply(&self, decision: &Decision) -> Effect {
        if let Some(existing) = self.applied.get(&decision.id) {
            debug!(decision = %decision.id, "Decision already applied");
            return existing.clone();
        }

        let effect = plan(decision);
        match self.applied.entry(decision.id) {
            dashmap::mapref::entry::Entry::Occupied(entry) => entry.get().clone(),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                for action in &effect.actions {
                    self.sink.perform(action);
                }
                entry.insert(effect.clone());
                self.remember(decision.id);
                effect
            }
        }
    }

    fn remember(&self, id: Uuid) {
        let mut order = self.order.lock().unwrap_or_else(|e| e.into_inner());
        order.push_back(id);
        while order.len() > self.capacity {
            if let Some(oldest) = order.pop_front() {
                self.applied.remove(&oldest);
                debug!(decision = %oldest, "Evicted applied decision");
            }
        }
    }

    /// Drop the record of an applied Decision once the host is done with it
    pub fn forget(&self, decision_id: &Uuid) {
        if self.applied.remove(decision_id).is_some() {
            let mut order = self.order.lock().unwrap_or_else(|e| e.into_inner());
            order.retain(|id| id != decision_id);
        }
    }

    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }
}

impl Default for EffectApplier {
    fn default() -> Self {
        Self::new(Arc::new(NoopSink))
    }
}
