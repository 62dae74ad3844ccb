use anyhow::Result;
use async_trait::async_trait;

use super::types::{GenerateConfig, GenerateResponse, Message};

/// Single-turn text completion backend for prompt hooks
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a response from the LLM (non-streaming)
    async fn generate(&self, messages: &[Message], config: &GenerateConfig) -> Result<GenerateResponse>;

    /// Provider model name for logging/tracking
    fn model_name(&self) -> &str;
}
