use crate::config::Config;
use anyhow::{Context, Result};
use hookgate_adapters::build_executors;
use hookgate_runtime::{
    AnthropicClient, Evaluation, HookEngine, HookEventName, LLMProvider, PayloadBuilder,
};
use serde_json::{json, Value};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Evaluate one event read from stdin. Returns whether the decision blocks.
pub async fn execute(
    event: Option<HookEventName>,
    verbose: bool,
    config: &Config,
    project: Option<&Path>,
) -> Result<bool> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read event JSON from stdin")?;
    let trigger: Value = if input.trim().is_empty() {
        json!({})
    } else {
        serde_json::from_str(&input).context("Failed to parse event JSON from stdin")?
    };

    let session = super::open_session(config, project)?;
    for e in session.snapshot.errors() {
        eprintln!("hook configuration error: {}", e);
    }

    let event = match event {
        Some(event) => event,
        None => PayloadBuilder::from_json(&trigger)?.event(),
    };
    // cwd from stdin wins over the project root
    let builder = PayloadBuilder::new(event)
        .cwd(session.project_root.clone())
        .merge_json(&trigger)?;

    let provider = build_provider(config);
    let executors = build_executors(
        session.project_root.clone(),
        provider,
        config.generate_config(),
    )?;
    let engine = HookEngine::new(Arc::new(session.snapshot), executors)
        .with_max_parallel(config.engine.max_parallel);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling hooks");
            interrupt.cancel();
        }
    });

    let evaluation = engine.evaluate_with_cancel(builder, cancel).await;
    let effect = engine.apply(&evaluation.decision);

    let mut report = json!({
        "decision": evaluation.decision,
        "effect": effect,
    });
    if verbose || config.engine.verbose {
        report["results"] = results_json(&evaluation);
    }
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(effect.blocks())
}

/// Anthropic client when configured and keyed; otherwise prompt hooks fail open
pub fn build_provider(config: &Config) -> Option<Arc<dyn LLMProvider>> {
    match config.llm.provider.as_str() {
        "anthropic" => match AnthropicClient::from_env(&config.llm.api_key_env) {
            Ok(client) => {
                info!(model = %config.llm.model, "Prompt hooks use Anthropic");
                Some(Arc::new(client.with_model(&config.llm.model)))
            }
            Err(e) => {
                warn!(error = %e, "No LLM provider, prompt hooks will not vote");
                None
            }
        },
        "none" => None,
        other => {
            warn!(provider = other, "Unknown LLM provider, prompt hooks will not vote");
            None
        }
    }
}

fn results_json(evaluation: &Evaluation) -> Value {
    evaluation
        .results
        .iter()
        .map(|r| {
            json!({
                "hook": r.hook.to_string(),
                "kind": r.kind,
                "exitCode": r.exit_code,
                "timedOut": r.timed_out,
                "durationMs": r.duration_ms,
                "stdout": r.stdout,
                "stderr": r.stderr,
                "output": r.output,
                "error": r.error,
            })
        })
        .collect()
}
