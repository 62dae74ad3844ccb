use crate::config::Config;
use anyhow::Result;
use hookgate_runtime::{ConfigChangeEvent, SettingsSources, SnapshotWatcher};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::info;

/// Print settings edits until Ctrl-C. Edits are reported, never applied.
pub async fn execute(config: &Config, project: Option<&Path>) -> Result<()> {
    let session = super::open_session(config, project)?;
    info!(
        hooks = session.snapshot.total_hooks(),
        loaded_at = %session.snapshot.loaded_at(),
        "Session snapshot taken"
    );
    print!("{}", render_sources(&session.sources));

    let watcher = SnapshotWatcher::new(Arc::new(session.snapshot));
    let mut changes = watcher.subscribe();
    watcher.watch().await?;

    loop {
        tokio::select! {
            change = changes.recv() => match change {
                Ok(ConfigChangeEvent::Modified { layer, path }) => {
                    println!("{} settings changed: {} (applies next session)", layer, path.display());
                }
                Ok(ConfigChangeEvent::Failure(e)) => eprintln!("watch error: {}", e),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

/// One line per watched settings file
pub fn render_sources(sources: &SettingsSources) -> String {
    sources
        .iter()
        .map(|source| format!("watching {} settings: {}\n", source.layer, source.path.display()))
        .collect()
}
