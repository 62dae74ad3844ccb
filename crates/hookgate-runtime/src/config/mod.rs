pub mod settings;
pub mod snapshot;
pub mod watcher;

pub use settings::{ConfigWarning, SettingsLayer, SettingsSource, SettingsSources};
pub use snapshot::{HookSnapshot, LayerChange, LayerSummary};
pub use watcher::{ConfigChangeEvent, SnapshotWatcher};
