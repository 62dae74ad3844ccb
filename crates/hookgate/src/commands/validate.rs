use crate::config::Config;
use anyhow::Result;
use hookgate_runtime::HookSnapshot;
use std::fmt::Write;
use std::path::Path;

/// Print the settings report. Returns whether any configuration error was found.
pub fn execute(config: &Config, project: Option<&Path>) -> Result<bool> {
    let session = super::open_session(config, project)?;
    print!("{}", render_report(&session.snapshot));
    Ok(!session.snapshot.errors().is_empty())
}

pub fn render_report(snapshot: &HookSnapshot) -> String {
    let mut out = String::new();
    for layer in snapshot.layers() {
        let path = layer
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<inline>".to_string());
        let state = match &layer.checksum {
            Some(sum) => format!("{} groups, sha256 {}", layer.groups, &sum[..12.min(sum.len())]),
            None if layer.path.is_some() => "not present".to_string(),
            None => format!("{} groups", layer.groups),
        };
        let _ = writeln!(out, "{:<11} {} ({})", layer.layer, path, state);
    }

    if snapshot.errors().is_empty() && snapshot.warnings().is_empty() {
        let _ = writeln!(out, "OK: {} hooks", snapshot.total_hooks());
        return out;
    }
    for e in snapshot.errors() {
        let _ = writeln!(out, "error: {}", e);
    }
    for w in snapshot.warnings() {
        let _ = writeln!(out, "warning: {}", w);
    }
    out
}
