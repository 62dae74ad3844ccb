//! Layered hook settings: where each layer lives and how its `hooks` section
//! is parsed into groups.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

use crate::error::ConfigError;
use crate::hooks::definition::{HookConfig, HookGroup, HookKind, HookRef, DEFAULT_TIMEOUT_SECS};
use crate::hooks::matcher::{FilePatterns, Matcher};
use crate::hooks::{HookEventName, MatcherTarget};

/// Timeouts outside this range load, with a warning
const USUAL_TIMEOUT_SECS: std::ops::RangeInclusive<u64> = 1..=600;

/// Settings layer, highest precedence first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsLayer {
    Enterprise,
    Project,
    User,
    Local,
}

impl SettingsLayer {
    pub const ALL: [SettingsLayer; 4] = [
        SettingsLayer::Enterprise,
        SettingsLayer::Project,
        SettingsLayer::User,
        SettingsLayer::Local,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingsLayer::Enterprise => "enterprise",
            SettingsLayer::Project => "project",
            SettingsLayer::User => "user",
            SettingsLayer::Local => "local",
        }
    }
}

impl fmt::Display for SettingsLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Location of one layer's settings file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsSource {
    pub layer: SettingsLayer,
    pub path: PathBuf,
}

/// Settings files for a project, in precedence order
#[derive(Debug, Clone)]
pub struct SettingsSources {
    project_root: PathBuf,
    sources: Vec<SettingsSource>,
}

impl SettingsSources {
    /// Standard locations for `project_root`. The user layer is skipped when
    /// there is no home directory.
    pub fn discover(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let mut sources = vec![SettingsSource {
            layer: SettingsLayer::Enterprise,
            path: managed_settings_path(),
        }];
        sources.push(SettingsSource {
            layer: SettingsLayer::Project,
            path: project_root.join(".claude").join("settings.json"),
        });
        if let Some(home) = dirs::home_dir() {
            sources.push(SettingsSource {
                layer: SettingsLayer::User,
                path: home.join(".claude").join("settings.json"),
            });
        }
        sources.push(SettingsSource {
            layer: SettingsLayer::Local,
            path: project_root.join(".claude").join("settings.local.json"),
        });
        Self {
            project_root,
            sources,
        }
    }

    /// No layers at all; add them with `with_override`
    pub fn empty(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            sources: Vec::new(),
        }
    }

    /// Point a layer at a different file
    pub fn with_override(mut self, layer: SettingsLayer, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match self.sources.iter_mut().find(|s| s.layer == layer) {
            Some(source) => source.path = path,
            None => {
                self.sources.push(SettingsSource { layer, path });
                self.sources.sort_by_key(|s| s.layer);
            }
        }
        self
    }

    /// Stop reading a layer
    pub fn without(mut self, layer: SettingsLayer) -> Self {
        self.sources.retain(|s| s.layer != layer);
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn iter(&self) -> impl Iterator<Item = &SettingsSource> {
        self.sources.iter()
    }

    pub fn get(&self, layer: SettingsLayer) -> Option<&SettingsSource> {
        self.sources.iter().find(|s| s.layer == layer)
    }
}

#[cfg(target_os = "macos")]
fn managed_settings_path() -> PathBuf {
    PathBuf::from("/Library/Application Support/ClaudeCode/managed-settings.json")
}

#[cfg(not(target_os = "macos"))]
fn managed_settings_path() -> PathBuf {
    PathBuf::from("/etc/claude-code/managed-settings.json")
}

/// Suspicious but loadable configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigWarning {
    pub layer: SettingsLayer,
    pub event: HookEventName,
    pub index: usize,
    pub message: String,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} settings: {} group #{}: {}",
            self.layer, self.event, self.index, self.message
        )
    }
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    #[serde(default)]
    matcher: Option<String>,
    hooks: Vec<RawHook>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHook {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    timeout: Option<u64>,
    #[serde(default)]
    file_patterns: Vec<String>,
}

/// Groups parsed from one layer's `hooks` section
#[derive(Debug, Default)]
pub struct ParsedHooks {
    pub groups: Vec<HookGroup>,
    pub errors: Vec<ConfigError>,
    pub warnings: Vec<ConfigWarning>,
}

/// Parse a settings document (`{"hooks": {...}}`) for one layer.
///
/// `next_order` is the session-wide declared-order counter; each loaded group
/// takes the next value. Malformed groups are reported and skipped.
pub fn parse_settings(layer: SettingsLayer, document: &Value, next_order: &mut usize) -> ParsedHooks {
    let mut parsed = ParsedHooks::default();

    let section = match document.get("hooks") {
        None | Some(Value::Null) => return parsed,
        Some(Value::Object(section)) => section,
        Some(_) => {
            parsed.errors.push(ConfigError::InvalidHooksSection { layer });
            return parsed;
        }
    };

    for (name, groups) in section {
        let event: HookEventName = match name.parse() {
            Ok(event) => event,
            Err(_) => {
                parsed.errors.push(ConfigError::UnknownEvent {
                    layer,
                    event: name.clone(),
                });
                continue;
            }
        };

        let Some(groups) = groups.as_array() else {
            parsed.errors.push(ConfigError::InvalidGroup {
                layer,
                event: name.clone(),
                index: 0,
                message: "expected an array of hook groups".to_string(),
            });
            continue;
        };

        for (index, raw) in groups.iter().enumerate() {
            match parse_group(layer, event, index, raw, *next_order, &mut parsed.warnings) {
                Ok(group) => {
                    *next_order += 1;
                    parsed.groups.push(group);
                }
                Err(message) => parsed.errors.push(ConfigError::InvalidGroup {
                    layer,
                    event: name.clone(),
                    index,
                    message,
                }),
            }
        }
    }

    for e in &parsed.errors {
        error!(layer = %layer, error = %e, "Hook configuration error");
    }
    for w in &parsed.warnings {
        warn!(layer = %layer, warning = %w, "Hook configuration warning");
    }
    parsed
}

fn parse_group(
    layer: SettingsLayer,
    event: HookEventName,
    index: usize,
    raw: &Value,
    order: usize,
    warnings: &mut Vec<ConfigWarning>,
) -> Result<HookGroup, String> {
    let raw: RawGroup = serde_json::from_value(raw.clone()).map_err(|e| e.to_string())?;
    if raw.hooks.is_empty() {
        return Err("group has no hooks".to_string());
    }

    let mut note = |message: String| {
        warnings.push(ConfigWarning {
            layer,
            event,
            index,
            message,
        })
    };

    let declared = raw.matcher.as_deref().map(str::trim).unwrap_or_default();
    if event.matcher_target() == MatcherTarget::None && !declared.is_empty() && declared != "*" {
        note(format!("matcher '{}' ignored: {} has no matcher", declared, event));
    }
    let matcher = Matcher::parse(event, raw.matcher.as_deref())?;

    let mut hooks = Vec::with_capacity(raw.hooks.len());
    for (hook_index, hook) in raw.hooks.into_iter().enumerate() {
        let kind = match hook.kind.as_str() {
            "command" => HookKind::Command {
                command: required_body(hook.command, "command", hook_index)?,
            },
            "prompt" => HookKind::Prompt {
                prompt: required_body(hook.prompt, "prompt", hook_index)?,
            },
            other => return Err(format!("hook {}: unknown type '{}'", hook_index, other)),
        };

        let timeout_secs = hook.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(format!("hook {}: timeout must be positive", hook_index));
        }
        if !USUAL_TIMEOUT_SECS.contains(&timeout_secs) {
            note(format!("hook {}: unusual timeout {}s", hook_index, timeout_secs));
        }

        let file_patterns =
            FilePatterns::parse(&hook.file_patterns).map_err(|e| format!("hook {}: {}", hook_index, e))?;

        hooks.push(HookConfig {
            id: HookRef {
                event,
                layer,
                group: order,
                index: hook_index,
            },
            kind,
            timeout: Duration::from_secs(timeout_secs),
            file_patterns,
        });
    }

    Ok(HookGroup {
        event,
        layer,
        order,
        matcher,
        hooks,
    })
}

fn required_body(body: Option<String>, field: &str, hook_index: usize) -> Result<String, String> {
    body.filter(|b| !b.trim().is_empty())
        .ok_or_else(|| format!("hook {}: '{}' is required", hook_index, field))
}
