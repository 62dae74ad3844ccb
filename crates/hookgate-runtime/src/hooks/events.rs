use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Hook lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HookEventName {
    /// Before a tool call runs
    PreToolUse,
    /// After a tool call completed
    PostToolUse,
    /// Before a user prompt is processed
    UserPromptSubmit,
    /// Assistant raised a notification
    Notification,
    /// Main agent is about to stop
    Stop,
    /// Subagent finished
    SubagentStop,
    /// Before context compaction
    PreCompact,
    /// Session started or resumed
    SessionStart,
    /// Session ended
    SessionEnd,
}

/// What a group's matcher is evaluated against for a given event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherTarget {
    ToolName,
    AgentName,
    CompactTrigger,
    SessionSource,
    /// Matcher-less event: groups always apply
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown hook event '{0}'")]
pub struct UnknownEvent(pub String);

impl HookEventName {
    pub const ALL: [HookEventName; 9] = [
        HookEventName::PreToolUse,
        HookEventName::PostToolUse,
        HookEventName::UserPromptSubmit,
        HookEventName::Notification,
        HookEventName::Stop,
        HookEventName::SubagentStop,
        HookEventName::PreCompact,
        HookEventName::SessionStart,
        HookEventName::SessionEnd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookEventName::PreToolUse => "PreToolUse",
            HookEventName::PostToolUse => "PostToolUse",
            HookEventName::UserPromptSubmit => "UserPromptSubmit",
            HookEventName::Notification => "Notification",
            HookEventName::Stop => "Stop",
            HookEventName::SubagentStop => "SubagentStop",
            HookEventName::PreCompact => "PreCompact",
            HookEventName::SessionStart => "SessionStart",
            HookEventName::SessionEnd => "SessionEnd",
        }
    }

    pub fn matcher_target(&self) -> MatcherTarget {
        match self {
            HookEventName::PreToolUse | HookEventName::PostToolUse => MatcherTarget::ToolName,
            HookEventName::SubagentStop => MatcherTarget::AgentName,
            HookEventName::PreCompact => MatcherTarget::CompactTrigger,
            HookEventName::SessionStart => MatcherTarget::SessionSource,
            HookEventName::UserPromptSubmit
            | HookEventName::Notification
            | HookEventName::Stop
            | HookEventName::SessionEnd => MatcherTarget::None,
        }
    }

    /// Whether hooks on this event can block the pending action
    pub fn can_block(&self) -> bool {
        matches!(
            self,
            HookEventName::PreToolUse
                | HookEventName::PostToolUse
                | HookEventName::UserPromptSubmit
                | HookEventName::Stop
                | HookEventName::SubagentStop
        )
    }

    /// Whether plain stdout of a successful command hook becomes injected context
    pub fn stdout_is_context(&self) -> bool {
        matches!(
            self,
            HookEventName::UserPromptSubmit | HookEventName::SessionStart
        )
    }
}

impl fmt::Display for HookEventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookEventName {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HookEventName::ALL
            .iter()
            .copied()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| UnknownEvent(s.to_string()))
    }
}

/// How a compaction was triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompactTrigger {
    Manual,
    Auto,
}

impl CompactTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompactTrigger::Manual => "manual",
            CompactTrigger::Auto => "auto",
        }
    }
}

/// Why a session started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStartSource {
    Startup,
    Resume,
    Clear,
}

impl SessionStartSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStartSource::Startup => "startup",
            SessionStartSource::Resume => "resume",
            SessionStartSource::Clear => "clear",
        }
    }
}

/// Context for one event occurrence, shared read-only by every hook evaluating it.
/// Serializes to the JSON object written to command hooks on stdin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventPayload {
    pub session_id: String,
    pub transcript_path: PathBuf,
    pub cwd: PathBuf,
    pub hook_event_name: HookEventName,
    #[serde(flatten)]
    pub fields: EventFields,
}

/// Event-specific payload fields
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventFields {
    ToolUse {
        tool_name: String,
        tool_input: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_response: Option<Value>,
    },
    UserPromptSubmit {
        prompt: String,
    },
    Notification {
        message: String,
    },
    Stop {
        stop_hook_active: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        agent_name: Option<String>,
    },
    PreCompact {
        trigger: CompactTrigger,
        custom_instructions: String,
    },
    SessionStart {
        source: SessionStartSource,
    },
    SessionEnd {
        reason: String,
    },
}

impl EventPayload {
    pub fn event(&self) -> HookEventName {
        self.hook_event_name
    }

    pub fn tool_name(&self) -> Option<&str> {
        match &self.fields {
            EventFields::ToolUse { tool_name, .. } => Some(tool_name),
            _ => None,
        }
    }

    pub fn tool_input(&self) -> Option<&Value> {
        match &self.fields {
            EventFields::ToolUse { tool_input, .. } => Some(tool_input),
            _ => None,
        }
    }

    pub fn prompt(&self) -> Option<&str> {
        match &self.fields {
            EventFields::UserPromptSubmit { prompt } => Some(prompt),
            _ => None,
        }
    }

    /// The name a group's matcher is evaluated against
    pub fn matcher_subject(&self) -> Option<&str> {
        match (&self.fields, self.hook_event_name.matcher_target()) {
            (EventFields::ToolUse { tool_name, .. }, MatcherTarget::ToolName) => Some(tool_name),
            (EventFields::Stop { agent_name, .. }, MatcherTarget::AgentName) => {
                agent_name.as_deref()
            }
            (EventFields::PreCompact { trigger, .. }, _) => Some(trigger.as_str()),
            (EventFields::SessionStart { source }, _) => Some(source.as_str()),
            _ => None,
        }
    }

    /// File path the tool call touches, if its input names one
    pub fn file_path(&self) -> Option<&str> {
        let input = self.tool_input()?;
        ["file_path", "path", "notebook_path"]
            .iter()
            .find_map(|key| input.get(*key).and_then(Value::as_str))
    }

    /// Stdin JSON for command hooks
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
