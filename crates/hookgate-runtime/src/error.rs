//! Typed errors for the parts of the engine callers need to match on.
//!
//! Execution failures (spawn errors, LLM request failures, timeouts) are not
//! here: they are folded into a failed `HookResult` and never escape the
//! scheduler.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::SettingsLayer;
use crate::hooks::HookEventName;

/// Malformed hook configuration. The offending layer or group is excluded for the session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{layer} settings {path:?} could not be read: {message}")]
    Unreadable {
        layer: SettingsLayer,
        path: PathBuf,
        message: String,
    },

    #[error("{layer} settings {path:?} is not valid JSON: {message}")]
    InvalidJson {
        layer: SettingsLayer,
        path: PathBuf,
        message: String,
    },

    #[error("{layer} settings: 'hooks' must be an object keyed by event name")]
    InvalidHooksSection { layer: SettingsLayer },

    #[error("{layer} settings: unknown hook event '{event}'")]
    UnknownEvent { layer: SettingsLayer, event: String },

    #[error("{layer} settings: {event} group #{index}: {message}")]
    InvalidGroup {
        layer: SettingsLayer,
        event: String,
        index: usize,
        message: String,
    },
}

/// The payload for an event could not be assembled
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PayloadError {
    #[error("payload must be a JSON object")]
    NotAnObject,

    #[error("missing 'hook_event_name'")]
    MissingEventName,

    #[error(transparent)]
    UnknownEvent(#[from] crate::hooks::events::UnknownEvent),

    #[error("{event} payload missing required field '{field}'")]
    MissingField {
        event: HookEventName,
        field: &'static str,
    },

    #[error("{event} payload field '{field}' is invalid: expected {expected}")]
    InvalidField {
        event: HookEventName,
        field: &'static str,
        expected: &'static str,
    },
}

/// A hook response could not be used as a vote
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OutputError {
    #[error("response contains no JSON object")]
    NoJson,

    #[error("response does not match the hook output schema: {0}")]
    Schema(String),

    #[error("hookSpecificOutput is for {found}, but the firing event is {expected}")]
    EventMismatch {
        expected: HookEventName,
        found: HookEventName,
    },
}
