use std::fmt;
use std::time::Duration;

use serde::Serialize;

use super::events::HookEventName;
use super::matcher::{FilePatterns, Matcher};
use crate::config::SettingsLayer;

/// Default per-hook timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Stable reference to one configured hook.
/// `group` is the group's position in the session-wide declared order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct HookRef {
    pub event: HookEventName,
    pub layer: SettingsLayer,
    pub group: usize,
    pub index: usize,
}

impl HookRef {
    /// Sort key for declared order
    pub fn order(&self) -> (usize, usize) {
        (self.group, self.index)
    }
}

impl fmt::Display for HookRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]#{}.{}",
            self.event, self.layer, self.group, self.index
        )
    }
}

/// Execution model of a hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookKind {
    /// External process; payload JSON on stdin
    Command { command: String },
    /// LLM evaluation of a rendered prompt template
    Prompt { prompt: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HookKindTag {
    Command,
    Prompt,
}

impl HookKind {
    pub fn tag(&self) -> HookKindTag {
        match self {
            HookKind::Command { .. } => HookKindTag::Command,
            HookKind::Prompt { .. } => HookKindTag::Prompt,
        }
    }

    /// Command line or prompt template
    pub fn body(&self) -> &str {
        match self {
            HookKind::Command { command } => command,
            HookKind::Prompt { prompt } => prompt,
        }
    }
}

impl fmt::Display for HookKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookKindTag::Command => f.pad("command"),
            HookKindTag::Prompt => f.pad("prompt"),
        }
    }
}

/// Static definition of one hook, read-only for the session
#[derive(Debug, Clone)]
pub struct HookConfig {
    pub id: HookRef,
    pub kind: HookKind,
    pub timeout: Duration,
    pub file_patterns: FilePatterns,
}

impl HookConfig {
    pub fn event(&self) -> HookEventName {
        self.id.event
    }
}

/// A matcher plus the hooks it gates, run sequentially in declared order
#[derive(Debug, Clone)]
pub struct HookGroup {
    pub event: HookEventName,
    pub layer: SettingsLayer,
    pub order: usize,
    pub matcher: Matcher,
    pub hooks: Vec<HookConfig>,
}

impl HookGroup {
    /// Command hook followed by prompt hook(s)
    pub fn is_hybrid(&self) -> bool {
        let tags: Vec<HookKindTag> = self.hooks.iter().map(|h| h.kind.tag()).collect();
        tags.contains(&HookKindTag::Command) && tags.contains(&HookKindTag::Prompt)
    }
}
