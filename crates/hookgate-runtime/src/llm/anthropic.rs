use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use serde_json::{json, Value};

use super::provider::LLMProvider;
use super::types::*;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";

/// Anthropic Messages API client
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(api_key: &str) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: ANTHROPIC_API_URL.to_string(),
        })
    }

    /// Read the key from an environment variable
    pub fn from_env(var: &str) -> Result<Self> {
        let key = std::env::var(var).with_context(|| format!("{} is not set", var))?;
        Self::new(&key)
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    fn build_request_body(&self, messages: &[Message], config: &GenerateConfig) -> Value {
        let model = if config.model.is_empty() {
            &self.model
        } else {
            &config.model
        };

        let mut body = json!({
            "model": model,
            "max_tokens": config.max_tokens,
            "temperature": config.temperature,
        });

        // System text goes to the top-level field, never into messages
        let system: Vec<&str> = config
            .system_prompt
            .as_deref()
            .into_iter()
            .chain(
                messages
                    .iter()
                    .filter(|m| m.role == Role::System)
                    .map(|m| m.text.as_str()),
            )
            .collect();
        if !system.is_empty() {
            body["system"] = json!(system.join("\n\n"));
        }

        let api_messages: Vec<Value> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                let role = match m.role {
                    Role::Assistant => "assistant",
                    _ => "user",
                };
                json!({"role": role, "content": [{"type": "text", "text": m.text}]})
            })
            .collect();
        body["messages"] = json!(api_messages);

        body
    }

    fn parse_response(&self, body: &ApiResponse) -> GenerateResponse {
        let text = body
            .content
            .iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        let stop_reason = match body.stop_reason.as_deref() {
            Some("max_tokens") => StopReason::MaxTokens,
            Some("stop_sequence") => StopReason::StopSequence,
            _ => StopReason::EndTurn,
        };

        GenerateResponse {
            text,
            stop_reason,
            usage: Usage {
                input_tokens: body.usage.input_tokens,
                output_tokens: body.usage.output_tokens,
            },
            model: body.model.clone(),
        }
    }
}

#[async_trait]
impl LLMProvider for AnthropicClient {
    async fn generate(&self, messages: &[Message], config: &GenerateConfig) -> Result<GenerateResponse> {
        let body = self.build_request_body(messages, config);

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Anthropic API error ({}): {}", status, error_body));
        }

        let api_response: ApiResponse = response.json().await?;
        Ok(self.parse_response(&api_response))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Anthropic API response structures
#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}
