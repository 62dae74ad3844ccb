pub mod command_executor;
pub mod prompt_executor;

pub use command_executor::{CommandExecutor, FILE_PATHS_ENV, PROJECT_DIR_ENV};
pub use prompt_executor::PromptExecutor;

use anyhow::Result;
use hookgate_runtime::llm::{GenerateConfig, LLMProvider};
use hookgate_runtime::ExecutorSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Executors for both hook kinds. Without a provider, prompt hooks fail open.
pub fn build_executors(
    project_root: PathBuf,
    provider: Option<Arc<dyn LLMProvider>>,
    config: GenerateConfig,
) -> Result<ExecutorSet> {
    let mut executors = ExecutorSet::new().with_command(Arc::new(CommandExecutor::new(project_root)));
    if let Some(provider) = provider {
        executors = executors.with_prompt(Arc::new(PromptExecutor::new(provider)?.with_config(config)));
    }
    Ok(executors)
}
