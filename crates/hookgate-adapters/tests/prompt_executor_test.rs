use anyhow::{anyhow, Result};
use async_trait::async_trait;
use hookgate_adapters::{build_executors, PromptExecutor};
use hookgate_runtime::hooks::{FilePatterns, HookKind, HookRef};
use hookgate_runtime::{
    GenerateConfig, GenerateResponse, HookConfig, HookEngine, HookEventName, HookExecutor,
    HookSnapshot, LLMProvider, Message, PayloadBuilder, PermissionDecision, SettingsLayer,
    StopReason, Usage,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Provider returning a canned reply after an optional delay, recording prompts
struct MockProvider {
    reply: Result<String, String>,
    delay: Duration,
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn failing(error: &str) -> Self {
        Self {
            reply: Err(error.to_string()),
            ..Self::replying("")
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::replying(r#"{"hookSpecificOutput": {"permissionDecision": "deny"}}"#)
        }
    }
}

#[async_trait]
impl LLMProvider for MockProvider {
    async fn generate(&self, messages: &[Message], config: &GenerateConfig) -> Result<GenerateResponse> {
        assert!(config.system_prompt.as_deref().unwrap_or_default().contains("JSON"));
        self.prompts
            .lock()
            .unwrap()
            .extend(messages.iter().map(|m| m.text.clone()));
        tokio::time::sleep(self.delay).await;
        match &self.reply {
            Ok(text) => Ok(GenerateResponse {
                text: text.clone(),
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
                model: "mock".into(),
            }),
            Err(e) => Err(anyhow!("{}", e)),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

fn prompt_hook(prompt: &str, timeout_secs: u64) -> HookConfig {
    HookConfig {
        id: HookRef {
            event: HookEventName::PreToolUse,
            layer: SettingsLayer::User,
            group: 0,
            index: 0,
        },
        kind: HookKind::Prompt {
            prompt: prompt.to_string(),
        },
        timeout: Duration::from_secs(timeout_secs),
        file_patterns: FilePatterns::default(),
    }
}

fn force_push() -> PayloadBuilder {
    PayloadBuilder::new(HookEventName::PreToolUse)
        .session_id("sess-7")
        .transcript_path("/tmp/t.jsonl")
        .cwd("/repo")
        .field("tool_name", "Bash")
        .field("tool_input", json!({"command": "git push --force origin main"}))
}

const POLICY: &str = "Deny force pushes to protected branches (main, release/*). \
                      Command: {{tool_input.command}}";

#[tokio::test]
async fn test_force_push_denied() {
    let provider = Arc::new(MockProvider::replying(
        r#"{"hookSpecificOutput": {"hookEventName": "PreToolUse", "permissionDecision": "deny", "permissionDecisionReason": "Force push to protected branch main"}}"#,
    ));
    let snapshot = HookSnapshot::from_json(&json!({"hooks": {"PreToolUse": [
        {"matcher": "Bash", "hooks": [{"type": "prompt", "prompt": POLICY, "timeout": 30}]}
    ]}}));
    let executors = build_executors("/".into(), Some(provider.clone() as Arc<dyn LLMProvider>), GenerateConfig::default()).unwrap();
    let engine = HookEngine::new(Arc::new(snapshot), executors);

    let decision = engine.evaluate(force_push()).await;

    assert_eq!(decision.permission_decision, Some(PermissionDecision::Deny));
    assert!(!decision
        .permission_decision_reason
        .unwrap_or_default()
        .is_empty());
    let prompts = provider.prompts.lock().unwrap();
    assert!(prompts[0].ends_with("Command: git push --force origin main"));
}

#[tokio::test]
async fn test_prose_around_json_tolerated() {
    let provider = Arc::new(MockProvider::replying(
        "Looking at this command, it rewrites history.\n```json\n{\"decision\": \"block\", \"reason\": \"history rewrite\"}\n```\nHope that helps!",
    ));
    let executor = PromptExecutor::new(provider).unwrap();
    let payload = force_push().build().unwrap();

    let result = executor
        .execute(&prompt_hook(POLICY, 30), &payload, &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.is_usable());
    let source = result.output.unwrap();
    let vote = source.decision_source().unwrap();
    assert_eq!(vote.permission(), PermissionDecision::Deny);
    assert_eq!(vote.reason(), Some("history rewrite"));
}

#[tokio::test]
async fn test_non_json_reply_casts_no_vote() {
    let provider = Arc::new(MockProvider::replying("I think this is probably fine."));
    let executor = PromptExecutor::new(provider).unwrap();
    let payload = force_push().build().unwrap();

    let result = executor
        .execute(&prompt_hook(POLICY, 30), &payload, &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.output.is_none());
    assert!(result.error.as_deref().unwrap().contains("unusable response"));
}

#[tokio::test]
async fn test_wrong_event_in_reply_is_schema_violation() {
    let provider = Arc::new(MockProvider::replying(
        r#"{"hookSpecificOutput": {"hookEventName": "PostToolUse", "permissionDecision": "deny"}}"#,
    ));
    let executor = PromptExecutor::new(provider).unwrap();
    let result = executor
        .execute(&prompt_hook(POLICY, 30), &force_push().build().unwrap(), &CancellationToken::new())
        .await
        .unwrap();
    assert!(result.output.is_none());
    assert!(result.error.is_some());
}

#[tokio::test]
async fn test_request_failure_is_error() {
    let executor = PromptExecutor::new(Arc::new(MockProvider::failing("503 overloaded"))).unwrap();
    let result = executor
        .execute(&prompt_hook(POLICY, 30), &force_push().build().unwrap(), &CancellationToken::new())
        .await;
    assert!(format!("{:#}", result.unwrap_err()).contains("503 overloaded"));
}

#[tokio::test]
async fn test_slow_provider_fails_open() {
    let provider = Arc::new(MockProvider::slow(Duration::from_secs(10)));
    let snapshot = HookSnapshot::from_json(&json!({"hooks": {"PreToolUse": [
        {"matcher": "*", "hooks": [{"type": "prompt", "prompt": POLICY, "timeout": 1}]}
    ]}}));
    let executors = build_executors("/".into(), Some(provider as Arc<dyn LLMProvider>), GenerateConfig::default()).unwrap();
    let engine = HookEngine::new(Arc::new(snapshot), executors);

    let started = Instant::now();
    let decision = engine.evaluate(force_push()).await;

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(decision.permission_decision, Some(PermissionDecision::Allow));
    assert!(!decision.is_blocking());
}

#[tokio::test]
async fn test_prompt_hooks_without_provider_fail_open() {
    let snapshot = HookSnapshot::from_json(&json!({"hooks": {"PreToolUse": [
        {"matcher": "*", "hooks": [{"type": "prompt", "prompt": POLICY}]}
    ]}}));
    let executors = build_executors("/".into(), None, GenerateConfig::default()).unwrap();
    let engine = HookEngine::new(Arc::new(snapshot), executors);

    let decision = engine.evaluate(force_push()).await;
    assert_eq!(decision.permission_decision, Some(PermissionDecision::Allow));
    assert!(decision.user_notices[0].contains("no prompt executor"));
}
