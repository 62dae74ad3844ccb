use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::HookEventName;

/// PreToolUse permission outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionDecision {
    Allow,
    Ask,
    Deny,
}

impl PermissionDecision {
    /// Higher is more restrictive
    pub fn restrictiveness(&self) -> u8 {
        match self {
            PermissionDecision::Allow => 0,
            PermissionDecision::Ask => 1,
            PermissionDecision::Deny => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockDecision {
    Block,
}

/// The single merged outcome for one event occurrence
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub id: Uuid,
    pub event: HookEventName,
    /// PreToolUse only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_decision: Option<PermissionDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_decision_reason: Option<String>,
    /// PostToolUse, UserPromptSubmit, Stop, SubagentStop
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_decision: Option<BlockDecision>,
    /// Every blocking hook's reason, in declared order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub continue_session: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
    pub suppress_output: bool,
    /// Non-blocking hook errors; shown to the user, never to the agent
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub user_notices: Vec<String>,
    /// Stdout of successful hooks for the verbose transcript
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transcript: Vec<String>,
}

impl Decision {
    /// Default when no hook ran or every hook failed
    pub fn permissive(event: HookEventName) -> Self {
        Self {
            id: Uuid::new_v4(),
            event,
            permission_decision: (event == HookEventName::PreToolUse)
                .then_some(PermissionDecision::Allow),
            permission_decision_reason: None,
            block_decision: None,
            reason: None,
            continue_session: true,
            stop_reason: None,
            additional_context: None,
            system_message: None,
            suppress_output: false,
            user_notices: Vec::new(),
            transcript: Vec::new(),
        }
    }

    /// Whether the pending action is stopped (deny/ask, block, or session halt)
    pub fn is_blocking(&self) -> bool {
        !self.continue_session
            || self.block_decision.is_some()
            || matches!(
                self.permission_decision,
                Some(PermissionDecision::Deny | PermissionDecision::Ask)
            )
    }
}
