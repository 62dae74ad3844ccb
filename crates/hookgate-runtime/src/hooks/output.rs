//! Advanced JSON Output: the structured response a hook may emit.
//!
//! Responses come in two shapes. The legacy `decision: approve|block` field,
//! and the newer `hookSpecificOutput` object. Both are accepted; when both
//! carry a verdict, `hookSpecificOutput.permissionDecision` wins.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::decision::PermissionDecision;
use super::events::HookEventName;
use crate::error::OutputError;

/// Legacy two-valued verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyDecision {
    Approve,
    Block,
}

impl From<LegacyDecision> for PermissionDecision {
    fn from(d: LegacyDecision) -> Self {
        match d {
            LegacyDecision::Approve => PermissionDecision::Allow,
            LegacyDecision::Block => PermissionDecision::Deny,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookSpecificOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_event_name: Option<HookEventName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_decision: Option<PermissionDecision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_decision_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
}

/// Where a hook's verdict came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource<'a> {
    Specific {
        decision: PermissionDecision,
        reason: Option<&'a str>,
    },
    Legacy {
        decision: LegacyDecision,
        reason: Option<&'a str>,
    },
}

impl DecisionSource<'_> {
    pub fn permission(&self) -> PermissionDecision {
        match self {
            DecisionSource::Specific { decision, .. } => *decision,
            DecisionSource::Legacy { decision, .. } => (*decision).into(),
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            DecisionSource::Specific { reason, .. } | DecisionSource::Legacy { reason, .. } => {
                *reason
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookOutput {
    #[serde(rename = "continue", default, skip_serializing_if = "Option::is_none")]
    pub continue_session: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub suppress_output: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<LegacyDecision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_specific_output: Option<HookSpecificOutput>,
}

impl HookOutput {
    /// Validate a JSON value against the output schema for `event`
    pub fn parse(event: HookEventName, value: Value) -> Result<Self, OutputError> {
        if !value.is_object() {
            return Err(OutputError::Schema("expected a JSON object".into()));
        }
        let output: HookOutput =
            serde_json::from_value(value).map_err(|e| OutputError::Schema(e.to_string()))?;

        if let Some(found) = output
            .hook_specific_output
            .as_ref()
            .and_then(|s| s.hook_event_name)
        {
            if found != event {
                return Err(OutputError::EventMismatch {
                    expected: event,
                    found,
                });
            }
        }
        Ok(output)
    }

    /// Parse free text, using the first JSON object found in it
    pub fn from_text(event: HookEventName, text: &str) -> Result<Self, OutputError> {
        let value = extract_first_json(text).ok_or(OutputError::NoJson)?;
        Self::parse(event, value)
    }

    /// Synthesized output for a blocking exit code
    pub fn blocking(event: HookEventName, reason: String) -> Self {
        if event == HookEventName::PreToolUse {
            Self {
                hook_specific_output: Some(HookSpecificOutput {
                    hook_event_name: Some(event),
                    permission_decision: Some(PermissionDecision::Deny),
                    permission_decision_reason: Some(reason),
                    additional_context: None,
                }),
                ..Default::default()
            }
        } else {
            Self {
                decision: Some(LegacyDecision::Block),
                reason: Some(reason),
                ..Default::default()
            }
        }
    }

    /// Synthesized output carrying injectable context
    pub fn context(event: HookEventName, context: String) -> Self {
        Self {
            hook_specific_output: Some(HookSpecificOutput {
                hook_event_name: Some(event),
                additional_context: Some(context),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Verdict, preferring `hookSpecificOutput.permissionDecision` over legacy `decision`
    pub fn decision_source(&self) -> Option<DecisionSource<'_>> {
        let specific = self.hook_specific_output.as_ref().and_then(|s| {
            s.permission_decision.map(|decision| DecisionSource::Specific {
                decision,
                reason: s
                    .permission_decision_reason
                    .as_deref()
                    .or(self.reason.as_deref()),
            })
        });
        specific.or_else(|| {
            self.decision.map(|decision| DecisionSource::Legacy {
                decision,
                reason: self.reason.as_deref(),
            })
        })
    }

    pub fn is_block(&self) -> bool {
        self.decision == Some(LegacyDecision::Block)
    }

    pub fn additional_context(&self) -> Option<&str> {
        self.hook_specific_output
            .as_ref()
            .and_then(|s| s.additional_context.as_deref())
    }
}

/// Find the first complete JSON object embedded in `text`
pub fn extract_first_json(text: &str) -> Option<Value> {
    for (start, _) in text.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        if let Some(Ok(value @ Value::Object(_))) = stream.next() {
            return Some(value);
        }
    }
    None
}
