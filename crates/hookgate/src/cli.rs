use clap::{Parser, Subcommand};
use hookgate_runtime::HookEventName;
use std::path::PathBuf;

fn parse_event(s: &str) -> Result<HookEventName, String> {
    s.parse().map_err(|e| format!("{}", e))
}

#[derive(Parser)]
#[command(name = "hookgate")]
#[command(about = "Hookgate - lifecycle hook evaluation engine", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file (default: ./hookgate.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Project root (overrides [engine].project_root)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new config file
    Init {
        /// Path for new config file
        #[arg(default_value = "hookgate.toml")]
        path: PathBuf,
    },
    /// Evaluate one event: trigger JSON on stdin, Decision JSON on stdout.
    /// Exits 2 when the decision blocks.
    Run {
        /// Event name (defaults to hook_event_name from stdin)
        #[arg(long, value_parser = parse_event)]
        event: Option<HookEventName>,
        /// Include per-hook results in the output
        #[arg(long)]
        verbose: bool,
    },
    /// Check hook settings and report errors and warnings per layer
    Validate,
    /// Show configured hook groups
    List {
        /// Only this event
        #[arg(long, value_parser = parse_event)]
        event: Option<HookEventName>,
    },
    /// Report edits to hook settings until interrupted
    Watch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from(["hookgate", "run", "--event", "PreToolUse", "--verbose"]).unwrap();
        match cli.command {
            Commands::Run { event, verbose } => {
                assert_eq!(event, Some(HookEventName::PreToolUse));
                assert!(verbose);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_unknown_event_rejected() {
        assert!(Cli::try_parse_from(["hookgate", "run", "--event", "BeforeLunch"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["hookgate", "list", "--project", "/repo"]).unwrap();
        assert_eq!(cli.project, Some(PathBuf::from("/repo")));
    }
}
