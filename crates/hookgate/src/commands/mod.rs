pub mod init;
pub mod list;
pub mod run;
pub mod validate;
pub mod watch;

use crate::config::Config;
use anyhow::Result;
use hookgate_runtime::{HookSnapshot, SettingsSources};
use std::path::{Path, PathBuf};

/// Everything a command needs to know about the session's hook settings
pub struct Session {
    pub project_root: PathBuf,
    pub sources: SettingsSources,
    pub snapshot: HookSnapshot,
}

/// Resolve the project root and take the session snapshot
pub fn open_session(config: &Config, project: Option<&Path>) -> Result<Session> {
    let project_root = config.project_root(project)?;
    let sources = config.settings_sources(&project_root)?;
    let snapshot = HookSnapshot::load(&sources);
    Ok(Session {
        project_root,
        sources,
        snapshot,
    })
}
