use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::events::{EventFields, EventPayload, HookEventName};
use crate::error::PayloadError;

/// Assembles the `EventPayload` for one event occurrence from whatever the
/// host loop has at hand.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    event: HookEventName,
    session_id: Option<String>,
    transcript_path: Option<PathBuf>,
    cwd: Option<PathBuf>,
    fields: Map<String, Value>,
}

impl PayloadBuilder {
    pub fn new(event: HookEventName) -> Self {
        Self {
            event,
            session_id: None,
            transcript_path: None,
            cwd: None,
            fields: Map::new(),
        }
    }

    /// Start from a stdin-contract JSON object (`hook_event_name` selects the event)
    pub fn from_json(value: &Value) -> Result<Self, PayloadError> {
        let object = value.as_object().ok_or(PayloadError::NotAnObject)?;
        let event: HookEventName = object
            .get("hook_event_name")
            .and_then(Value::as_str)
            .ok_or(PayloadError::MissingEventName)?
            .parse()?;
        Self::new(event).merge_json(value)
    }

    /// Copy every key of `value` into the builder; common fields land in their slots
    pub fn merge_json(mut self, value: &Value) -> Result<Self, PayloadError> {
        let object = value.as_object().ok_or(PayloadError::NotAnObject)?;
        for (key, v) in object {
            match key.as_str() {
                "hook_event_name" => {}
                "session_id" => self.session_id = v.as_str().map(str::to_string),
                "transcript_path" => self.transcript_path = v.as_str().map(PathBuf::from),
                "cwd" => self.cwd = v.as_str().map(PathBuf::from),
                _ => {
                    self.fields.insert(key.clone(), v.clone());
                }
            }
        }
        Ok(self)
    }

    pub fn event(&self) -> HookEventName {
        self.event
    }

    pub fn session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    pub fn transcript_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.transcript_path = Some(path.into());
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Set an event-specific field (`tool_name`, `prompt`, `trigger`, ...)
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Validate required fields and produce the immutable payload
    pub fn build(self) -> Result<EventPayload, PayloadError> {
        let event = self.event;
        let session_id = self
            .session_id
            .clone()
            .ok_or(PayloadError::MissingField {
                event,
                field: "session_id",
            })?;
        let transcript_path = self
            .transcript_path
            .clone()
            .ok_or(PayloadError::MissingField {
                event,
                field: "transcript_path",
            })?;
        let cwd = self.cwd.clone().ok_or(PayloadError::MissingField {
            event,
            field: "cwd",
        })?;

        let fields = match event {
            HookEventName::PreToolUse => EventFields::ToolUse {
                tool_name: self.require("tool_name", "a string")?,
                tool_input: self.require_value("tool_input")?,
                tool_response: None,
            },
            HookEventName::PostToolUse => EventFields::ToolUse {
                tool_name: self.require("tool_name", "a string")?,
                tool_input: self.require_value("tool_input")?,
                tool_response: Some(self.require_value("tool_response")?),
            },
            HookEventName::UserPromptSubmit => EventFields::UserPromptSubmit {
                prompt: self.require("prompt", "a string")?,
            },
            HookEventName::Notification => EventFields::Notification {
                message: self.require("message", "a string")?,
            },
            HookEventName::Stop | HookEventName::SubagentStop => EventFields::Stop {
                stop_hook_active: self
                    .optional("stop_hook_active", "a boolean")?
                    .unwrap_or(false),
                agent_name: self.optional("agent_name", "a string")?,
            },
            HookEventName::PreCompact => EventFields::PreCompact {
                trigger: self.require("trigger", "\"manual\" or \"auto\"")?,
                custom_instructions: self
                    .optional("custom_instructions", "a string")?
                    .unwrap_or_default(),
            },
            HookEventName::SessionStart => EventFields::SessionStart {
                source: self.require("source", "\"startup\", \"resume\" or \"clear\"")?,
            },
            HookEventName::SessionEnd => EventFields::SessionEnd {
                reason: self
                    .optional("reason", "a string")?
                    .unwrap_or_else(|| "other".to_string()),
            },
        };

        Ok(EventPayload {
            session_id,
            transcript_path,
            cwd,
            hook_event_name: event,
            fields,
        })
    }

    fn require_value(&self, field: &'static str) -> Result<Value, PayloadError> {
        match self.fields.get(field) {
            Some(Value::Null) | None => Err(PayloadError::MissingField {
                event: self.event,
                field,
            }),
            Some(v) => Ok(v.clone()),
        }
    }

    fn require<T: DeserializeOwned>(
        &self,
        field: &'static str,
        expected: &'static str,
    ) -> Result<T, PayloadError> {
        self.optional(field, expected)?
            .ok_or(PayloadError::MissingField {
                event: self.event,
                field,
            })
    }

    fn optional<T: DeserializeOwned>(
        &self,
        field: &'static str,
        expected: &'static str,
    ) -> Result<Option<T>, PayloadError> {
        match self.fields.get(field) {
            Some(Value::Null) | None => Ok(None),
            Some(v) => serde_json::from_value(v.clone())
                .map(Some)
                .map_err(|_| PayloadError::InvalidField {
                    event: self.event,
                    field,
                    expected,
                }),
        }
    }
}
