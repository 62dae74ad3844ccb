use anyhow::Result;
use std::path::Path;

pub const DEFAULT_CONFIG: &str = r#"# Hookgate Configuration

[engine]
# project_root = "~/code/my-project"   # default: working directory
max_parallel = 0                        # hook groups at once, 0 = unbounded
verbose = false

[llm]
provider = "anthropic"                  # "none": prompt hooks fail open
model = "claude-3-5-haiku-latest"
api_key_env = "ANTHROPIC_API_KEY"
max_tokens = 1024

[settings]
# enterprise = "/etc/claude-code/managed-settings.json"
# project = "./.claude/settings.json"
# user = "~/.claude/settings.json"
# local = "./.claude/settings.local.json"
"#;

/// Initialize a new config file
pub fn run_init(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Config already exists at {:?}", path);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CONFIG)?;
    println!("Created config at {:?}", path);
    Ok(())
}
