use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use hookgate_runtime::hooks::{EventPayload, HookConfig, HookEventName, HookExecutor, HookKind, HookOutput, HookResult};
use hookgate_runtime::llm::{GenerateConfig, LLMProvider, Message};
use regex::{Captures, Regex};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Evaluates prompt hooks with a single-turn LLM request
pub struct PromptExecutor {
    provider: Arc<dyn LLMProvider>,
    config: GenerateConfig,
    placeholder: Regex,
}

impl PromptExecutor {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Result<Self> {
        Ok(Self {
            provider,
            config: GenerateConfig::default(),
            // `$ARGUMENTS` is the whole payload; `{{path}}` one field of it
            placeholder: Regex::new(r"\$ARGUMENTS|\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}")
                .context("Failed to compile placeholder pattern")?,
        })
    }

    pub fn with_config(mut self, config: GenerateConfig) -> Self {
        self.config = config;
        self
    }

    /// Substitute payload fields into a prompt template in a single pass.
    /// Substituted text is never scanned again.
    pub fn render(&self, template: &str, payload: &EventPayload) -> String {
        let json = payload.to_json();
        self.placeholder
            .replace_all(template, |caps: &Captures| match caps.get(1) {
                Some(path) => lookup(&json, path.as_str())
                    .map(display_value)
                    .unwrap_or_default(),
                None => json.to_string(),
            })
            .into_owned()
    }
}

#[async_trait]
impl HookExecutor for PromptExecutor {
    fn name(&self) -> &str {
        "prompt"
    }

    async fn execute(
        &self,
        hook: &HookConfig,
        payload: &EventPayload,
        cancel: &CancellationToken,
    ) -> Result<HookResult> {
        let HookKind::Prompt { prompt } = &hook.kind else {
            bail!("hook {} is not a prompt hook", hook.id);
        };
        let started = Instant::now();
        let event = payload.event();

        let messages = [Message::user(&self.render(prompt, payload))];
        let config = GenerateConfig {
            system_prompt: Some(response_instructions(event)),
            ..self.config.clone()
        };

        debug!(hook = %hook.id, model = self.provider.model_name(), "Evaluating prompt hook");

        let response = tokio::select! {
            response = tokio::time::timeout(hook.timeout, self.provider.generate(&messages, &config)) => {
                match response {
                    Ok(response) => response.context("LLM request failed")?,
                    Err(_) => return Ok(HookResult::timed_out(hook, started.elapsed())),
                }
            }
            _ = cancel.cancelled() => {
                debug!(hook = %hook.id, "Prompt hook abandoned");
                return Ok(HookResult::cancelled(hook, started.elapsed()));
            }
        };

        let result = HookResult {
            stdout: response.text.clone(),
            ..HookResult::new(hook, started.elapsed())
        };
        match HookOutput::from_text(event, &response.text) {
            Ok(output) => Ok(HookResult {
                output: Some(output),
                ..result
            }),
            Err(e) => {
                warn!(hook = %hook.id, error = %e, "Unusable prompt hook response");
                Ok(HookResult {
                    error: Some(format!("unusable response: {}", e)),
                    ..result
                })
            }
        }
    }
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, key| match current {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// System prompt telling the model which JSON shape to answer with
fn response_instructions(event: HookEventName) -> String {
    let shape = match event {
        HookEventName::PreToolUse => format!(
            r#"{{"hookSpecificOutput": {{"hookEventName": "{}", "permissionDecision": "allow" | "deny" | "ask", "permissionDecisionReason": "<why>"}}}}"#,
            event
        ),
        HookEventName::UserPromptSubmit => format!(
            r#"{{"decision": "block" (omit to allow), "reason": "<why>", "hookSpecificOutput": {{"hookEventName": "{}", "additionalContext": "<context for the agent>"}}}}"#,
            event
        ),
        HookEventName::SessionStart => format!(
            r#"{{"hookSpecificOutput": {{"hookEventName": "{}", "additionalContext": "<context for the agent>"}}}}"#,
            event
        ),
        HookEventName::PostToolUse | HookEventName::Stop | HookEventName::SubagentStop => {
            r#"{"decision": "block" (omit to allow), "reason": "<instruction for the agent>"}"#.to_string()
        }
        HookEventName::Notification | HookEventName::PreCompact | HookEventName::SessionEnd => {
            r#"{"systemMessage": "<message for the user>"}"#.to_string()
        }
    };
    format!(
        "You are a hook evaluating a {} event in a coding agent session. \
         Respond with a single JSON object and nothing else, shaped like:\n{}\n\
         Optional fields: \"continue\": false with \"stopReason\" halts the session; \
         \"systemMessage\" is shown to the user.",
        event, shape
    )
}
