use anyhow::{Context, Result};
use hookgate_runtime::llm::anthropic::DEFAULT_MODEL;
use hookgate_runtime::{GenerateConfig, SettingsLayer, SettingsSources};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "hookgate.toml";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub settings: SettingsConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Defaults to the working directory
    #[serde(default)]
    pub project_root: Option<String>,

    /// Max hook groups running at once (0 = unbounded)
    #[serde(default)]
    pub max_parallel: usize,

    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LlmConfig {
    /// "anthropic", or "none" to let prompt hooks fail open
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

/// Per-layer settings file overrides
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SettingsConfig {
    #[serde(default)]
    pub enterprise: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub local: Option<String>,
}

fn default_provider() -> String {
    "anthropic".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Config {
    /// `--project` wins over the config file; both fall back to the working directory
    pub fn project_root(&self, cli_override: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = cli_override {
            return Ok(path.to_path_buf());
        }
        match &self.engine.project_root {
            Some(root) => expand(root),
            None => std::env::current_dir().context("Failed to resolve working directory"),
        }
    }

    pub fn settings_sources(&self, project_root: &Path) -> Result<SettingsSources> {
        let mut sources = SettingsSources::discover(project_root);
        let overrides = [
            (SettingsLayer::Enterprise, &self.settings.enterprise),
            (SettingsLayer::Project, &self.settings.project),
            (SettingsLayer::User, &self.settings.user),
            (SettingsLayer::Local, &self.settings.local),
        ];
        for (layer, path) in overrides {
            if let Some(path) = path {
                sources = sources.with_override(layer, expand(path)?);
            }
        }
        Ok(sources)
    }

    pub fn generate_config(&self) -> GenerateConfig {
        GenerateConfig {
            model: self.llm.model.clone(),
            max_tokens: self.llm.max_tokens,
            ..GenerateConfig::default()
        }
    }
}

/// Expand `~` and environment variables in a configured path
fn expand(path: &str) -> Result<PathBuf> {
    let expanded =
        shellexpand::full(path).with_context(|| format!("Failed to expand path: {}", path))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Load config from file, `./hookgate.toml`, or defaults
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !fallback.exists() {
                return Ok(Config::default());
            }
            fallback
        }
    };

    let content =
        fs::read_to_string(&path).context(format!("Failed to read config file: {:?}", path))?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).context("Failed to parse TOML config")
}
