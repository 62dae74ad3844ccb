use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::definition::{HookConfig, HookKindTag};
use super::events::EventPayload;
use super::result::HookResult;

/// Runs one hook against one payload.
///
/// Timeouts are the executor's job: report them as `Ok` with `timed_out` set.
/// `Err` means the hook could not run at all; the scheduler turns it into a
/// failed result that casts no vote.
#[async_trait]
pub trait HookExecutor: Send + Sync {
    /// Executor name for logging
    fn name(&self) -> &str;

    async fn execute(
        &self,
        hook: &HookConfig,
        payload: &EventPayload,
        cancel: &CancellationToken,
    ) -> Result<HookResult>;
}

/// Executors by hook kind
#[derive(Clone, Default)]
pub struct ExecutorSet {
    command: Option<Arc<dyn HookExecutor>>,
    prompt: Option<Arc<dyn HookExecutor>>,
}

impl ExecutorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_command(mut self, executor: Arc<dyn HookExecutor>) -> Self {
        self.command = Some(executor);
        self
    }

    pub fn with_prompt(mut self, executor: Arc<dyn HookExecutor>) -> Self {
        self.prompt = Some(executor);
        self
    }

    pub fn for_kind(&self, kind: HookKindTag) -> Option<&Arc<dyn HookExecutor>> {
        match kind {
            HookKindTag::Command => self.command.as_ref(),
            HookKindTag::Prompt => self.prompt.as_ref(),
        }
    }
}
