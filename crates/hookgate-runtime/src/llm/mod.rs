pub mod anthropic;
pub mod provider;
pub mod types;

pub use anthropic::AnthropicClient;
pub use provider::LLMProvider;
pub use types::{GenerateConfig, GenerateResponse, Message, Role, StopReason, Usage};
