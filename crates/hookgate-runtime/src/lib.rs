pub mod config;
pub mod error;
pub mod hooks;
pub mod llm;

pub use config::{
    ConfigChangeEvent, ConfigWarning, HookSnapshot, LayerChange, LayerSummary, SettingsLayer,
    SettingsSources, SnapshotWatcher,
};
pub use error::{ConfigError, OutputError, PayloadError};
pub use hooks::{
    Decision, Effect, EffectAction, EffectApplier, EffectSink, EventPayload, Evaluation,
    ExecutorSet, HookConfig, HookEngine, HookEventName, HookExecutor, HookKind, HookOutput,
    HookResult, PayloadBuilder, PermissionDecision,
};
pub use llm::{AnthropicClient, GenerateConfig, GenerateResponse, LLMProvider, Message, Role, StopReason, Usage};

/// Initialize structured JSON logging on stderr.
/// `RUST_LOG` wins; otherwise `default_directive` (e.g. "info").
pub fn init_logging(default_directive: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
