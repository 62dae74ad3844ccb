use crate::config::Config;
use anyhow::Result;
use hookgate_runtime::{HookEventName, HookSnapshot};
use std::fmt::Write;
use std::path::Path;

pub fn execute(config: &Config, project: Option<&Path>, event: Option<HookEventName>) -> Result<()> {
    let session = super::open_session(config, project)?;
    print!("{}", render_groups(&session.snapshot, event));
    Ok(())
}

/// Groups per event in declared order
pub fn render_groups(snapshot: &HookSnapshot, only: Option<HookEventName>) -> String {
    let mut out = String::new();
    for event in snapshot.events().filter(|e| only.map_or(true, |o| o == *e)) {
        let _ = writeln!(out, "{}", event);
        for group in snapshot.groups_for(event) {
            let hybrid = if group.is_hybrid() { " (hybrid)" } else { "" };
            let _ = writeln!(
                out,
                "  #{} [{}] matcher={}{}",
                group.order, group.layer, group.matcher, hybrid
            );
            for hook in &group.hooks {
                let patterns: Vec<&str> = hook.file_patterns.sources().collect();
                let files = if patterns.is_empty() {
                    String::new()
                } else {
                    format!(" files={}", patterns.join(","))
                };
                let _ = writeln!(
                    out,
                    "    {:<7} {:>4}s{}  {}",
                    hook.kind.tag(),
                    hook.timeout.as_secs(),
                    files,
                    hook.kind.body()
                );
            }
        }
    }
    if out.is_empty() {
        out.push_str("No hooks configured\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_groups() {
        let snapshot = HookSnapshot::from_json(&json!({"hooks": {
            "PostToolUse": [{"matcher": "Edit|Write", "hooks": [
                {"type": "command", "command": "cargo fmt", "filePatterns": ["*.rs"]},
                {"type": "prompt", "prompt": "Review {{tool_input.file_path}}", "timeout": 30}
            ]}],
            "Stop": [{"hooks": [{"type": "command", "command": "make test"}]}]
        }}));

        let all = render_groups(&snapshot, None);
        assert!(all.contains("PostToolUse\n"));
        assert!(all.contains("matcher=Edit|Write (hybrid)"));
        assert!(all.contains("files=*.rs  cargo fmt"));
        assert!(all.contains("  30s  Review"));
        assert!(all.contains("Stop\n"));

        let only_stop = render_groups(&snapshot, Some(HookEventName::Stop));
        assert!(!only_stop.contains("PostToolUse"));
        assert_eq!(
            render_groups(&snapshot, Some(HookEventName::PreCompact)),
            "No hooks configured\n"
        );
    }
}
