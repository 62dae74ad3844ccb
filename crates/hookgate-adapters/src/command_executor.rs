use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use hookgate_runtime::hooks::{
    EventPayload, HookConfig, HookExecutor, HookKind, HookOutput, HookResult, BLOCKING_EXIT_CODE,
};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Environment variable holding the project root for hook commands
pub const PROJECT_DIR_ENV: &str = "CLAUDE_PROJECT_DIR";

/// Environment variable holding the file a tool call touches, when there is one
pub const FILE_PATHS_ENV: &str = "CLAUDE_FILE_PATHS";

/// Runs command hooks as `sh -c <command>` with the payload JSON on stdin
pub struct CommandExecutor {
    project_root: PathBuf,
    env: Vec<(String, String)>,
}

impl CommandExecutor {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            env: Vec::new(),
        }
    }

    /// Extra environment for every hook process
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}

#[async_trait]
impl HookExecutor for CommandExecutor {
    fn name(&self) -> &str {
        "command"
    }

    async fn execute(
        &self,
        hook: &HookConfig,
        payload: &EventPayload,
        cancel: &CancellationToken,
    ) -> Result<HookResult> {
        let HookKind::Command { command } = &hook.kind else {
            bail!("hook {} is not a command hook", hook.id);
        };
        let started = Instant::now();
        let stdin_json = serde_json::to_vec(payload).context("Failed to serialize event payload")?;

        // Audit log: record exact command being executed
        info!(hook = %hook.id, cmd = command.as_str(), "Executing command hook");

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .current_dir(&self.project_root)
            .env(PROJECT_DIR_ENV, &self.project_root);
        if let Some(path) = payload.file_path() {
            cmd.env(FILE_PATHS_ENV, path);
        }
        let mut child = cmd
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn hook command '{}'", command))?;

        if let Some(mut stdin) = child.stdin.take() {
            tokio::spawn(async move {
                // the hook may exit without reading its input
                let _ = stdin.write_all(&stdin_json).await;
            });
        }

        // Dropping the wait future drops the child, which kills it
        let output = tokio::select! {
            output = child.wait_with_output() => output.context("Failed to wait for hook command")?,
            _ = tokio::time::sleep(hook.timeout) => {
                return Ok(HookResult::timed_out(hook, started.elapsed()));
            }
            _ = cancel.cancelled() => {
                debug!(hook = %hook.id, "Command hook cancelled");
                return Ok(HookResult::cancelled(hook, started.elapsed()));
            }
        };

        let exit_code = output.status.code();
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        let structured = match exit_code {
            None => {
                warn!(hook = %hook.id, status = %output.status, "Command hook terminated by signal");
                None
            }
            Some(BLOCKING_EXIT_CODE) => None,
            Some(_) => parse_stdout(hook, payload, &stdout),
        };

        Ok(HookResult {
            exit_code,
            output: structured,
            stdout,
            stderr,
            ..HookResult::new(hook, started.elapsed())
        })
    }
}

/// Stdout that is exactly one JSON object is structured output; anything else is plain text
fn parse_stdout(hook: &HookConfig, payload: &EventPayload, stdout: &str) -> Option<HookOutput> {
    let value: Value = serde_json::from_str(stdout.trim()).ok()?;
    if !value.is_object() {
        return None;
    }
    match HookOutput::parse(payload.event(), value) {
        Ok(output) => Some(output),
        Err(e) => {
            warn!(hook = %hook.id, error = %e, "Ignoring malformed JSON output");
            None
        }
    }
}
