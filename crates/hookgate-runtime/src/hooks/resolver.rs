use std::sync::Arc;

use tracing::debug;

use super::definition::HookConfig;
use super::events::{EventPayload, HookEventName};
use crate::config::HookSnapshot;

/// A matching group with its applicable hooks, in declared order
#[derive(Debug, Clone)]
pub struct ResolvedGroup {
    pub order: usize,
    pub hooks: Vec<HookConfig>,
}

/// Selects the configured groups that apply to an event occurrence
#[derive(Clone)]
pub struct MatcherResolver {
    snapshot: Arc<HookSnapshot>,
}

impl MatcherResolver {
    pub fn new(snapshot: Arc<HookSnapshot>) -> Self {
        Self { snapshot }
    }

    /// Groups whose matcher accepts the payload, in declared order.
    /// Hooks whose file patterns reject the payload's file are dropped, and so
    /// are groups left with no hooks.
    pub fn resolve(&self, event: HookEventName, payload: &EventPayload) -> Vec<ResolvedGroup> {
        let subject = payload.matcher_subject();
        let file_path = payload.file_path();

        let resolved: Vec<ResolvedGroup> = self
            .snapshot
            .groups_for(event)
            .iter()
            .filter(|group| group.matcher.matches(subject))
            .filter_map(|group| {
                let hooks: Vec<HookConfig> = group
                    .hooks
                    .iter()
                    .filter(|hook| hook.file_patterns.matches(file_path))
                    .cloned()
                    .collect();
                (!hooks.is_empty()).then_some(ResolvedGroup {
                    order: group.order,
                    hooks,
                })
            })
            .collect();

        debug!(
            event = %event,
            subject = ?subject,
            groups = resolved.len(),
            "Resolved hook groups"
        );
        resolved
    }
}
