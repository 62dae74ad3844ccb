use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{error, info};

use super::settings::{parse_settings, ConfigWarning, SettingsLayer, SettingsSources};
use crate::error::ConfigError;
use crate::hooks::definition::HookGroup;
use crate::hooks::HookEventName;

/// What was loaded from one layer
#[derive(Debug, Clone, Serialize)]
pub struct LayerSummary {
    pub layer: SettingsLayer,
    pub path: Option<PathBuf>,
    /// SHA-256 of the file contents; `None` when the file did not exist
    pub checksum: Option<String>,
    pub groups: usize,
}

/// A layer file whose contents differ from the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerChange {
    pub layer: SettingsLayer,
    pub path: PathBuf,
}

/// Hook configuration for one session. Taken once at session start and never
/// mutated; later edits to the settings files are detected, not applied.
#[derive(Debug)]
pub struct HookSnapshot {
    groups: HashMap<HookEventName, Vec<Arc<HookGroup>>>,
    layers: Vec<LayerSummary>,
    errors: Vec<ConfigError>,
    warnings: Vec<ConfigWarning>,
    loaded_at: DateTime<Utc>,
}

impl HookSnapshot {
    /// Read every layer in precedence order. Never fails: unreadable or
    /// malformed layers are recorded as errors and contribute no groups.
    pub fn load(sources: &SettingsSources) -> Self {
        let mut builder = SnapshotBuilder::default();

        for source in sources.iter() {
            let bytes = match std::fs::read(&source.path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    builder.layers.push(LayerSummary {
                        layer: source.layer,
                        path: Some(source.path.clone()),
                        checksum: None,
                        groups: 0,
                    });
                    continue;
                }
                Err(e) => {
                    builder.fail(ConfigError::Unreadable {
                        layer: source.layer,
                        path: source.path.clone(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let checksum = Some(checksum(&bytes));
            let document = match serde_json::from_slice::<Value>(&bytes) {
                Ok(document) => document,
                Err(e) => {
                    builder.fail(ConfigError::InvalidJson {
                        layer: source.layer,
                        path: source.path.clone(),
                        message: e.to_string(),
                    });
                    builder.layers.push(LayerSummary {
                        layer: source.layer,
                        path: Some(source.path.clone()),
                        checksum,
                        groups: 0,
                    });
                    continue;
                }
            };

            builder.add_layer(source.layer, Some(source.path.clone()), checksum, &document);
        }

        let snapshot = builder.finish();
        info!(
            layers = snapshot.layers.iter().filter(|l| l.checksum.is_some()).count(),
            hooks = snapshot.total_hooks(),
            errors = snapshot.errors.len(),
            "Hook snapshot loaded"
        );
        snapshot
    }

    /// Snapshot of a single in-memory project-layer document
    pub fn from_json(document: &Value) -> Self {
        Self::from_layers(&[(SettingsLayer::Project, document.clone())])
    }

    /// Snapshot of in-memory documents, given in precedence order
    pub fn from_layers(documents: &[(SettingsLayer, Value)]) -> Self {
        let mut builder = SnapshotBuilder::default();
        for (layer, document) in documents {
            builder.add_layer(*layer, None, None, document);
        }
        builder.finish()
    }

    /// Snapshot with no hooks
    pub fn empty() -> Self {
        SnapshotBuilder::default().finish()
    }

    /// Groups for an event in declared order
    pub fn groups_for(&self, event: HookEventName) -> &[Arc<HookGroup>] {
        self.groups.get(&event).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn events(&self) -> impl Iterator<Item = HookEventName> + '_ {
        HookEventName::ALL
            .into_iter()
            .filter(|e| !self.groups_for(*e).is_empty())
    }

    pub fn total_hooks(&self) -> usize {
        self.groups.values().flatten().map(|g| g.hooks.len()).sum()
    }

    pub fn layers(&self) -> &[LayerSummary] {
        &self.layers
    }

    pub fn errors(&self) -> &[ConfigError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[ConfigWarning] {
        &self.warnings
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Re-hash the layer files and report those that changed since load
    pub fn detect_changes(&self) -> Vec<LayerChange> {
        self.layers
            .iter()
            .filter_map(|summary| {
                let path = summary.path.as_ref()?;
                (file_checksum(path) != summary.checksum).then(|| LayerChange {
                    layer: summary.layer,
                    path: path.clone(),
                })
            })
            .collect()
    }
}

/// Hex SHA-256 of a settings file; `None` when it cannot be read
pub fn file_checksum(path: &Path) -> Option<String> {
    std::fs::read(path).ok().map(|bytes| checksum(&bytes))
}

fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[derive(Default)]
struct SnapshotBuilder {
    next_order: usize,
    groups: HashMap<HookEventName, Vec<Arc<HookGroup>>>,
    layers: Vec<LayerSummary>,
    errors: Vec<ConfigError>,
    warnings: Vec<ConfigWarning>,
}

impl SnapshotBuilder {
    fn add_layer(
        &mut self,
        layer: SettingsLayer,
        path: Option<PathBuf>,
        checksum: Option<String>,
        document: &Value,
    ) {
        let parsed = parse_settings(layer, document, &mut self.next_order);
        self.layers.push(LayerSummary {
            layer,
            path,
            checksum,
            groups: parsed.groups.len(),
        });
        for group in parsed.groups {
            self.groups
                .entry(group.event)
                .or_default()
                .push(Arc::new(group));
        }
        self.errors.extend(parsed.errors);
        self.warnings.extend(parsed.warnings);
    }

    fn fail(&mut self, e: ConfigError) {
        error!(error = %e, "Hook settings layer skipped");
        self.errors.push(e);
    }

    fn finish(mut self) -> HookSnapshot {
        for groups in self.groups.values_mut() {
            groups.sort_by_key(|g| g.order);
        }
        HookSnapshot {
            groups: self.groups,
            layers: self.layers,
            errors: self.errors,
            warnings: self.warnings,
            loaded_at: Utc::now(),
        }
    }
}
