use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use super::settings::SettingsLayer;
use super::snapshot::{file_checksum, HookSnapshot};

/// Settings change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigChangeEvent {
    /// Layer file differs from the session snapshot; applies next session
    Modified { layer: SettingsLayer, path: PathBuf },
    Failure(String),
}

/// Watches the snapshot's layer files and reports edits.
/// The snapshot is never reloaded.
pub struct SnapshotWatcher {
    snapshot: Arc<HookSnapshot>,
    change_tx: broadcast::Sender<ConfigChangeEvent>,
    debounce: Duration,
}

impl SnapshotWatcher {
    pub fn new(snapshot: Arc<HookSnapshot>) -> Self {
        let (change_tx, _) = broadcast::channel(16);
        Self {
            snapshot,
            change_tx,
            debounce: Duration::from_millis(500),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConfigChangeEvent> {
        self.change_tx.subscribe()
    }

    /// Start watching the layer directories (runs in a blocking task)
    pub async fn watch(&self) -> Result<()> {
        let mut known: HashMap<PathBuf, (SettingsLayer, Option<String>)> = HashMap::new();
        for summary in self.snapshot.layers() {
            if let Some(path) = &summary.path {
                known.insert(path.clone(), (summary.layer, summary.checksum.clone()));
            }
        }

        let dirs: BTreeSet<PathBuf> = known
            .keys()
            .filter_map(|p| p.parent().map(PathBuf::from))
            .filter(|d| d.is_dir())
            .collect();
        if dirs.is_empty() {
            warn!("No settings directories to watch");
            return Ok(());
        }

        let (tx, rx) = std::sync::mpsc::channel();
        let mut debouncer =
            new_debouncer(self.debounce, tx).context("Failed to create settings watcher")?;
        for dir in &dirs {
            debouncer
                .watcher()
                .watch(dir, notify::RecursiveMode::NonRecursive)
                .with_context(|| format!("Failed to watch {}", dir.display()))?;
        }

        info!(dirs = ?dirs, "Watching hook settings for changes");

        let change_tx = self.change_tx.clone();
        tokio::task::spawn_blocking(move || {
            let _debouncer = debouncer;

            for result in rx {
                match result {
                    Ok(events) => {
                        let touched: BTreeSet<&PathBuf> = events
                            .iter()
                            .filter(|e| e.kind == DebouncedEventKind::Any)
                            .map(|e| &e.path)
                            .collect();
                        for path in touched {
                            let Some((layer, last)) = known.get_mut(path) else {
                                continue;
                            };
                            let current = file_checksum(path);
                            if current == *last {
                                continue;
                            }
                            *last = current;
                            warn!(
                                layer = %layer,
                                path = ?path,
                                "Hook settings changed; changes apply next session"
                            );
                            let _ = change_tx.send(ConfigChangeEvent::Modified {
                                layer: *layer,
                                path: path.clone(),
                            });
                        }
                    }
                    Err(e) => {
                        error!("Settings watcher error: {:?}", e);
                        let _ = change_tx.send(ConfigChangeEvent::Failure(e.to_string()));
                    }
                }
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettingsSources;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_edit_is_flagged_not_applied() {
        let dir = TempDir::new().unwrap();
        let claude = dir.path().join(".claude");
        std::fs::create_dir_all(&claude).unwrap();
        let path = claude.join("settings.json");
        std::fs::write(
            &path,
            json!({"hooks": {"Stop": [{"hooks": [{"type": "command", "command": "a"}]}]}}).to_string(),
        )
        .unwrap();

        let sources = SettingsSources::empty(dir.path()).with_override(SettingsLayer::Project, &path);
        let snapshot = Arc::new(HookSnapshot::load(&sources));
        let watcher = SnapshotWatcher::new(snapshot.clone()).with_debounce(Duration::from_millis(100));
        let mut changes = watcher.subscribe();
        watcher.watch().await.unwrap();

        std::fs::write(&path, "{}").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), changes.recv())
            .await
            .expect("no change event")
            .unwrap();
        assert_eq!(
            event,
            ConfigChangeEvent::Modified {
                layer: SettingsLayer::Project,
                path: path.clone()
            }
        );
        assert_eq!(snapshot.total_hooks(), 1);
    }
}
