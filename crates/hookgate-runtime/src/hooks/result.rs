use std::fmt::Display;
use std::time::Duration;

use super::definition::{HookConfig, HookKindTag, HookRef};
use super::output::HookOutput;

/// Raw outcome of executing one hook. Consumed by the merger, then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct HookResult {
    pub hook: HookRef,
    pub kind: HookKindTag,
    /// Command hooks only
    pub exit_code: Option<i32>,
    /// Structured response: prompt hooks, or command hooks printing JSON
    pub output: Option<HookOutput>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub duration_ms: u64,
    /// Execution error (spawn failure, request failure, unusable response)
    pub error: Option<String>,
}

impl HookResult {
    pub fn new(hook: &HookConfig, duration: Duration) -> Self {
        Self {
            hook: hook.id,
            kind: hook.kind.tag(),
            exit_code: None,
            output: None,
            stdout: String::new(),
            stderr: String::new(),
            timed_out: false,
            duration_ms: duration.as_millis() as u64,
            error: None,
        }
    }

    pub fn failed(hook: &HookConfig, error: impl Display, duration: Duration) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(hook, duration)
        }
    }

    pub fn timed_out(hook: &HookConfig, duration: Duration) -> Self {
        Self {
            timed_out: true,
            ..Self::new(hook, duration)
        }
    }

    pub fn cancelled(hook: &HookConfig, duration: Duration) -> Self {
        Self::failed(hook, "cancelled", duration)
    }

    /// Completed without timeout or execution error
    pub fn is_usable(&self) -> bool {
        !self.timed_out && self.error.is_none()
    }
}
