use hookgate_adapters::{CommandExecutor, FILE_PATHS_ENV, PROJECT_DIR_ENV};
use hookgate_runtime::hooks::{FilePatterns, HookKind, HookRef, LegacyDecision};
use hookgate_runtime::{
    EventPayload, ExecutorSet, HookConfig, HookEngine, HookEventName, HookExecutor, HookSnapshot,
    PayloadBuilder, PermissionDecision, SettingsLayer,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn command_hook(command: &str, timeout_secs: u64) -> HookConfig {
    HookConfig {
        id: HookRef {
            event: HookEventName::PreToolUse,
            layer: SettingsLayer::Project,
            group: 0,
            index: 0,
        },
        kind: HookKind::Command {
            command: command.to_string(),
        },
        timeout: Duration::from_secs(timeout_secs),
        file_patterns: FilePatterns::default(),
    }
}

fn payload(command: &str) -> EventPayload {
    PayloadBuilder::new(HookEventName::PreToolUse)
        .session_id("sess-42")
        .transcript_path("/tmp/t.jsonl")
        .cwd("/repo")
        .field("tool_name", "Bash")
        .field("tool_input", json!({"command": command}))
        .build()
        .unwrap()
}

async fn run(dir: &TempDir, command: &str) -> hookgate_runtime::HookResult {
    CommandExecutor::new(dir.path())
        .execute(&command_hook(command, 10), &payload("ls"), &CancellationToken::new())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_payload_on_stdin() {
    let dir = TempDir::new().unwrap();
    let result = run(&dir, "cat").await;

    assert_eq!(result.exit_code, Some(0));
    let echoed: Value = serde_json::from_str(&result.stdout).unwrap();
    assert_eq!(echoed["hook_event_name"], "PreToolUse");
    assert_eq!(echoed["session_id"], "sess-42");
    assert_eq!(echoed["tool_input"]["command"], "ls");
    // the echoed payload is a JSON object but not hook output
    assert!(result.output.is_some());
    assert_eq!(result.output.unwrap().decision_source(), None);
}

#[tokio::test]
async fn test_cwd_and_project_dir_env() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().canonicalize().unwrap();

    let result = run(&dir, &format!("printf %s \"${}\"", PROJECT_DIR_ENV)).await;
    assert_eq!(result.stdout, dir.path().to_string_lossy());

    let result = run(&dir, "pwd -P").await;
    assert_eq!(result.stdout.trim(), root.to_string_lossy());
}

#[tokio::test]
async fn test_exit_two_keeps_stderr_and_ignores_json() {
    let dir = TempDir::new().unwrap();
    let result = run(
        &dir,
        r#"echo '{"decision": "approve"}'; echo 'rm -rf is not allowed' >&2; exit 2"#,
    )
    .await;

    assert_eq!(result.exit_code, Some(2));
    assert!(result.stderr.contains("rm -rf is not allowed"));
    assert!(result.output.is_none());
}

#[tokio::test]
async fn test_json_stdout_parsed() {
    let dir = TempDir::new().unwrap();
    let result = run(
        &dir,
        r#"echo '{"decision": "block", "reason": "nope", "suppressOutput": true}'"#,
    )
    .await;

    let output = result.output.unwrap();
    assert_eq!(output.decision, Some(LegacyDecision::Block));
    assert_eq!(output.reason.as_deref(), Some("nope"));
    assert!(output.suppress_output);
}

#[tokio::test]
async fn test_plain_stdout_and_other_exit_codes() {
    let dir = TempDir::new().unwrap();

    let result = run(&dir, "echo formatted 3 files").await;
    assert!(result.output.is_none());
    assert_eq!(result.stdout.trim(), "formatted 3 files");

    let result = run(&dir, "echo warning >&2; exit 42").await;
    assert_eq!(result.exit_code, Some(42));
    assert!(result.stderr.contains("warning"));
    assert!(result.is_usable());
}

#[tokio::test]
async fn test_file_path_env() {
    let dir = TempDir::new().unwrap();
    let edit = PayloadBuilder::new(HookEventName::PreToolUse)
        .session_id("sess-42")
        .transcript_path("/tmp/t.jsonl")
        .cwd("/repo")
        .field("tool_name", "Write")
        .field("tool_input", json!({"file_path": "src/lib.rs", "content": ""}))
        .build()
        .unwrap();
    let hook = command_hook(&format!("printf %s \"${{{}:-unset}}\"", FILE_PATHS_ENV), 10);
    let executor = CommandExecutor::new(dir.path());

    let result = executor.execute(&hook, &edit, &CancellationToken::new()).await.unwrap();
    assert_eq!(result.stdout, "src/lib.rs");

    let result = executor.execute(&hook, &payload("ls"), &CancellationToken::new()).await.unwrap();
    assert_eq!(result.stdout, "unset");
}

#[tokio::test]
async fn test_signal_killed_hook_is_not_success() {
    let dir = TempDir::new().unwrap();
    let command = r#"echo '{"decision": "approve"}'; kill -9 $$"#;
    let result = run(&dir, command).await;
    assert_eq!(result.exit_code, None);
    assert!(result.output.is_none());

    let snapshot = HookSnapshot::from_json(&json!({"hooks": {"UserPromptSubmit": [
        {"hooks": [{"type": "command", "command": "echo half-written-context; kill -9 $$"}]}
    ]}}));
    let executors = ExecutorSet::new().with_command(Arc::new(CommandExecutor::new(dir.path())));
    let engine = HookEngine::new(Arc::new(snapshot), executors);
    let decision = engine
        .evaluate(
            PayloadBuilder::new(HookEventName::UserPromptSubmit)
                .session_id("s")
                .transcript_path("/t")
                .cwd("/repo")
                .field("prompt", "hello"),
        )
        .await;

    assert_eq!(decision.additional_context, None);
    assert!(decision
        .user_notices
        .iter()
        .any(|n| n.contains("terminated by signal")));
}

#[tokio::test]
async fn test_timeout_kills_process() {
    let dir = TempDir::new().unwrap();
    let started = Instant::now();
    let result = CommandExecutor::new(dir.path())
        .execute(&command_hook("sleep 30", 1), &payload("ls"), &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.timed_out);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_cancellation_kills_process() {
    let dir = TempDir::new().unwrap();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let result = CommandExecutor::new(dir.path())
        .execute(&command_hook("sleep 30", 60), &payload("ls"), &cancel)
        .await
        .unwrap();

    assert!(!result.is_usable());
    assert!(!result.timed_out);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_missing_project_root_is_an_error() {
    let dir = TempDir::new().unwrap();
    let gone = dir.path().join("does-not-exist");
    let result = CommandExecutor::new(gone)
        .execute(&command_hook("true", 5), &payload("ls"), &CancellationToken::new())
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_engine_blocks_on_exit_two() {
    let dir = TempDir::new().unwrap();
    let snapshot = HookSnapshot::from_json(&json!({"hooks": {"PreToolUse": [
        {"matcher": "Bash", "hooks": [{"type": "command", "command": "exit 0"}]},
        {"matcher": "Bash", "hooks": [{
            "type": "command",
            "command": "grep -q 'push --force' && { echo 'force push blocked' >&2; exit 2; } || exit 0"
        }]},
        {"matcher": "Bash", "hooks": [{"type": "command", "command": "sleep 30", "timeout": 1}]}
    ]}}));
    let executors = ExecutorSet::new().with_command(Arc::new(CommandExecutor::new(dir.path())));
    let engine = HookEngine::new(Arc::new(snapshot), executors);

    let started = Instant::now();
    let evaluation = engine
        .evaluate_payload(
            Arc::new(payload("git push --force origin main")),
            CancellationToken::new(),
        )
        .await;

    assert!(started.elapsed() < Duration::from_secs(5));
    let decision = evaluation.decision;
    assert_eq!(decision.permission_decision, Some(PermissionDecision::Deny));
    assert_eq!(
        decision.permission_decision_reason.as_deref(),
        Some("force push blocked")
    );
    assert!(decision.user_notices.iter().any(|n| n.contains("timed out")));

    let safe = engine.evaluate(PayloadBuilder::new(HookEventName::PreToolUse)
        .session_id("s")
        .transcript_path("/t")
        .cwd("/repo")
        .field("tool_name", "Bash")
        .field("tool_input", json!({"command": "git status"})))
        .await;
    assert_eq!(safe.permission_decision, Some(PermissionDecision::Allow));
}
