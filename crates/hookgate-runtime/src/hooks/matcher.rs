//! Group matchers (tool / agent / trigger / source names) and per-hook file globs.

use std::fmt;

use regex::Regex;

use super::events::{HookEventName, MatcherTarget};

/// Characters that turn a matcher string into a regex
const REGEX_META: &[char] = &[
    '|', '(', ')', '[', ']', '{', '}', '.', '*', '+', '?', '^', '$', '\\',
];

const COMPACT_TRIGGERS: &[&str] = &["manual", "auto"];
const SESSION_SOURCES: &[&str] = &["startup", "resume", "clear"];

/// Predicate selecting which names a hook group applies to
#[derive(Debug, Clone)]
pub enum Matcher {
    /// `*`, empty, absent, or a matcher-less event
    Any,
    /// Case-sensitive literal
    Exact(String),
    /// Regex anchored to the whole name
    Pattern { source: String, regex: Regex },
}

impl Matcher {
    /// Parse a group's matcher for the given event
    pub fn parse(event: HookEventName, raw: Option<&str>) -> Result<Self, String> {
        let raw = raw.map(str::trim).unwrap_or_default();
        if raw.is_empty() || raw == "*" {
            return Ok(Matcher::Any);
        }

        match event.matcher_target() {
            MatcherTarget::None => Ok(Matcher::Any),
            MatcherTarget::CompactTrigger => literal_from(raw, COMPACT_TRIGGERS),
            MatcherTarget::SessionSource => literal_from(raw, SESSION_SOURCES),
            MatcherTarget::ToolName | MatcherTarget::AgentName => {
                if raw.contains(REGEX_META) {
                    let regex = Regex::new(&format!("^(?:{})$", raw))
                        .map_err(|e| format!("invalid matcher regex '{}': {}", raw, e))?;
                    Ok(Matcher::Pattern {
                        source: raw.to_string(),
                        regex,
                    })
                } else {
                    Ok(Matcher::Exact(raw.to_string()))
                }
            }
        }
    }

    /// Whether the group applies to `subject`. Only `Any` matches a missing subject.
    pub fn matches(&self, subject: Option<&str>) -> bool {
        match (self, subject) {
            (Matcher::Any, _) => true,
            (Matcher::Exact(expected), Some(name)) => expected == name,
            (Matcher::Pattern { regex, .. }, Some(name)) => regex.is_match(name),
            (_, None) => false,
        }
    }
}

fn literal_from(raw: &str, allowed: &[&str]) -> Result<Matcher, String> {
    if allowed.contains(&raw) {
        Ok(Matcher::Exact(raw.to_string()))
    } else {
        Err(format!(
            "matcher '{}' must be one of {}",
            raw,
            allowed.join(", ")
        ))
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Any => f.write_str("*"),
            Matcher::Exact(s) => f.write_str(s),
            Matcher::Pattern { source, .. } => f.write_str(source),
        }
    }
}

/// One compiled file glob
#[derive(Debug, Clone)]
struct FileGlob {
    source: String,
    regex: Regex,
    /// Pattern has no `/`: match against the file name only
    basename_only: bool,
}

/// Optional glob set restricting a hook to matching file paths
#[derive(Debug, Clone, Default)]
pub struct FilePatterns {
    globs: Vec<FileGlob>,
}

impl FilePatterns {
    pub fn parse(patterns: &[String]) -> Result<Self, String> {
        let mut globs = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let pattern = pattern.trim();
            if pattern.is_empty() {
                return Err("empty file pattern".to_string());
            }
            let regex = Regex::new(&glob_to_regex(pattern))
                .map_err(|e| format!("invalid file pattern '{}': {}", pattern, e))?;
            globs.push(FileGlob {
                source: pattern.to_string(),
                regex,
                basename_only: !pattern.contains('/'),
            });
        }
        Ok(Self { globs })
    }

    pub fn is_empty(&self) -> bool {
        self.globs.is_empty()
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.globs.iter().map(|g| g.source.as_str())
    }

    /// No patterns means unrestricted; otherwise a matching file path is required
    pub fn matches(&self, path: Option<&str>) -> bool {
        if self.globs.is_empty() {
            return true;
        }
        let Some(path) = path else {
            return false;
        };
        let path = path.strip_prefix("./").unwrap_or(path);
        let file_name = path.rsplit('/').next().unwrap_or(path);

        self.globs.iter().any(|glob| {
            if glob.basename_only {
                glob.regex.is_match(file_name)
            } else {
                glob.regex.is_match(path)
                    || glob.regex.is_match(path.trim_start_matches('/'))
            }
        })
    }
}

/// Translate `*`, `**`, `?` and `{a,b}` into an anchored regex
fn glob_to_regex(glob: &str) -> String {
    let mut out = String::from("^");
    let chars: Vec<char> = glob.chars().collect();
    let mut i = 0;
    let mut in_braces = false;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '*' if chars.get(i + 1) == Some(&'*') => {
                // `**/` also matches zero directories
                if chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
                continue;
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '{' => {
                in_braces = true;
                out.push_str("(?:");
            }
            '}' if in_braces => {
                in_braces = false;
                out.push(')');
            }
            ',' if in_braces => out.push('|'),
            _ => out.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }

    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(raw: &str) -> Matcher {
        Matcher::parse(HookEventName::PostToolUse, Some(raw)).unwrap()
    }

    #[test]
    fn test_alternation_matcher() {
        let m = tool("Edit|Write");
        assert!(m.matches(Some("Write")));
        assert!(m.matches(Some("Edit")));
        assert!(!m.matches(Some("Read")));
        assert!(!m.matches(Some("NotebookEdit")));
    }

    #[test]
    fn test_wildcard_and_empty_match_everything() {
        for raw in ["*", ""] {
            let m = tool(raw);
            assert!(m.matches(Some("Read")));
            assert!(m.matches(Some("mcp__github__create_issue")));
            assert!(m.matches(None));
        }
        assert!(Matcher::parse(HookEventName::PreToolUse, None)
            .unwrap()
            .matches(Some("Bash")));
    }

    #[test]
    fn test_exact_is_case_sensitive() {
        let m = tool("Bash");
        assert!(matches!(m, Matcher::Exact(_)));
        assert!(m.matches(Some("Bash")));
        assert!(!m.matches(Some("bash")));
        assert!(!m.matches(None));
    }

    #[test]
    fn test_regex_matcher() {
        let m = tool("mcp__.*__write.*");
        assert!(m.matches(Some("mcp__fs__write_file")));
        assert!(!m.matches(Some("mcp__fs__read_file")));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        assert!(Matcher::parse(HookEventName::PreToolUse, Some("Edit|(")).is_err());
    }

    #[test]
    fn test_restricted_literals() {
        assert!(Matcher::parse(HookEventName::PreCompact, Some("auto")).is_ok());
        assert!(Matcher::parse(HookEventName::PreCompact, Some("sometimes")).is_err());
        assert!(Matcher::parse(HookEventName::SessionStart, Some("clear")).is_ok());
        assert!(Matcher::parse(HookEventName::SessionStart, Some("Startup")).is_err());
    }

    #[test]
    fn test_matcher_ignored_on_matcherless_event() {
        let m = Matcher::parse(HookEventName::Stop, Some("Bash")).unwrap();
        assert!(matches!(m, Matcher::Any));
    }

    #[test]
    fn test_file_patterns() {
        let patterns =
            FilePatterns::parse(&["*.rs".to_string(), "docs/**/*.md".to_string()]).unwrap();
        assert!(patterns.matches(Some("src/lib.rs")));
        assert!(patterns.matches(Some("docs/guide/intro.md")));
        assert!(patterns.matches(Some("docs/intro.md")));
        assert!(!patterns.matches(Some("README.md")));
        assert!(!patterns.matches(None));
    }

    #[test]
    fn test_file_pattern_braces() {
        let patterns = FilePatterns::parse(&["*.{ts,tsx}".to_string()]).unwrap();
        assert!(patterns.matches(Some("web/app.tsx")));
        assert!(patterns.matches(Some("web/app.ts")));
        assert!(!patterns.matches(Some("web/app.js")));
    }

    #[test]
    fn test_empty_file_patterns_match_anything() {
        let patterns = FilePatterns::default();
        assert!(patterns.matches(None));
        assert!(patterns.matches(Some("x.py")));
    }
}
