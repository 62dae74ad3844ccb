//! Reduces every hook result for one event occurrence into a single Decision.
//!
//! Precedence, highest first:
//! 1. any `continue: false` halts the session (first stop reason in declared order)
//! 2. PreToolUse: deny > ask > allow, default allow
//! 3. PostToolUse / Stop / SubagentStop: any block blocks, reasons concatenated
//! 4. UserPromptSubmit: block beats context; otherwise contexts concatenated
//! 5. systemMessage accumulated, suppressOutput OR'd, independent of the above
//!
//! A permissive hook can never override a blocking one.

use super::decision::{BlockDecision, Decision, PermissionDecision};
use super::definition::HookKindTag;
use super::events::HookEventName;
use super::output::HookOutput;
use super::result::HookResult;

/// Exit code signalling a blocking verdict
pub const BLOCKING_EXIT_CODE: i32 = 2;

const DEFAULT_BLOCK_REASON: &str = "Blocked by hook";
const DEFAULT_ASK_REASON: &str = "Hook requested confirmation";
const DEFAULT_STOP_REASON: &str = "Session stopped by hook";

/// Merge results into one Decision. Always yields a Decision, even if every hook failed.
pub fn merge(event: HookEventName, results: &[HookResult]) -> Decision {
    let mut ordered: Vec<&HookResult> = results.iter().collect();
    ordered.sort_by_key(|r| r.hook.order());

    let mut decision = Decision::permissive(event);
    let mut halted = false;
    let mut stop_reason: Option<String> = None;
    let mut votes: Vec<(PermissionDecision, Option<String>)> = Vec::new();
    let mut block_reasons: Vec<String> = Vec::new();
    let mut contexts: Vec<String> = Vec::new();
    let mut system_messages: Vec<String> = Vec::new();

    for result in ordered {
        let Some(output) = interpret(event, result, &mut decision) else {
            continue;
        };

        if output.continue_session == Some(false) {
            halted = true;
            if stop_reason.is_none() {
                stop_reason = output.stop_reason.clone().filter(|s| !s.trim().is_empty());
            }
        }
        if let Some(message) = non_empty(output.system_message.as_deref()) {
            system_messages.push(message.to_string());
        }
        decision.suppress_output |= output.suppress_output;

        match event {
            HookEventName::PreToolUse => {
                if let Some(source) = output.decision_source() {
                    votes.push((
                        source.permission(),
                        non_empty(source.reason()).map(str::to_string),
                    ));
                }
            }
            HookEventName::PostToolUse
            | HookEventName::Stop
            | HookEventName::SubagentStop
            | HookEventName::UserPromptSubmit => {
                if output.is_block() {
                    block_reasons.push(
                        non_empty(output.reason.as_deref())
                            .unwrap_or(DEFAULT_BLOCK_REASON)
                            .to_string(),
                    );
                }
            }
            _ => {}
        }

        if event.stdout_is_context() {
            if let Some(context) = non_empty(output.additional_context()) {
                contexts.push(context.to_string());
            }
        }
    }

    if event == HookEventName::PreToolUse {
        let merged = votes
            .iter()
            .map(|(d, _)| *d)
            .max_by_key(PermissionDecision::restrictiveness)
            .unwrap_or(PermissionDecision::Allow);
        let reasons: Vec<&str> = votes
            .iter()
            .filter(|(d, _)| *d == merged)
            .filter_map(|(_, r)| r.as_deref())
            .collect();
        decision.permission_decision = Some(merged);
        decision.permission_decision_reason = if reasons.is_empty() {
            match merged {
                PermissionDecision::Deny => Some(DEFAULT_BLOCK_REASON.to_string()),
                PermissionDecision::Ask => Some(DEFAULT_ASK_REASON.to_string()),
                PermissionDecision::Allow => None,
            }
        } else {
            Some(reasons.join("\n"))
        };
    }

    if !block_reasons.is_empty() {
        decision.block_decision = Some(BlockDecision::Block);
        decision.reason = Some(block_reasons.join("\n"));
    }

    // A blocked prompt is erased, so there is nothing to attach context to
    if !contexts.is_empty() && decision.block_decision.is_none() {
        decision.additional_context = Some(contexts.join("\n"));
    }

    if !system_messages.is_empty() {
        decision.system_message = Some(system_messages.join("\n"));
    }

    if halted {
        decision.continue_session = false;
        decision.stop_reason = Some(stop_reason.unwrap_or_else(|| DEFAULT_STOP_REASON.to_string()));
    }

    decision
}

/// Turn one raw result into the output it votes with, if any.
/// Failures and plain stdout are recorded on the decision instead.
fn interpret(event: HookEventName, result: &HookResult, decision: &mut Decision) -> Option<HookOutput> {
    if result.timed_out {
        decision.user_notices.push(format!(
            "{} hook {} timed out after {}ms",
            result.kind, result.hook, result.duration_ms
        ));
        return None;
    }
    if let Some(error) = &result.error {
        decision
            .user_notices
            .push(format!("{} hook {} failed: {}", result.kind, result.hook, error));
        return None;
    }

    if result.exit_code == Some(BLOCKING_EXIT_CODE) {
        let reason = non_empty(Some(result.stderr.as_str())).unwrap_or(DEFAULT_BLOCK_REASON);
        if event.can_block() {
            return Some(HookOutput::blocking(event, reason.to_string()));
        }
        decision
            .user_notices
            .push(format!("hook {}: {}", result.hook, reason));
        return None;
    }

    if result.kind == HookKindTag::Command && result.exit_code.is_none() {
        decision
            .user_notices
            .push(format!("hook {} terminated by signal", result.hook));
        return None;
    }

    if let Some(output) = &result.output {
        return Some(output.clone());
    }

    match result.exit_code {
        // prompt hooks carry no exit code
        Some(0) | None => {
            let stdout = non_empty(Some(result.stdout.as_str()))?;
            if event.stdout_is_context() {
                return Some(HookOutput::context(event, stdout.to_string()));
            }
            decision.transcript.push(stdout.to_string());
            None
        }
        Some(code) => {
            let detail = non_empty(Some(result.stderr.as_str())).unwrap_or("no stderr");
            decision.user_notices.push(format!(
                "hook {} exited with code {}: {}",
                result.hook, code, detail
            ));
            None
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
