//! Interfaces to the collaborators the engine drives but does not own.
//!
//! The windowing layer, the settings backend and subprocess execution live
//! outside the engine; they are reached only through these traits so the
//! workflows can run against fakes in tests.

pub mod events;

pub use events::EngineEvent;

use crate::common::EngineResult;
use async_trait::async_trait;
use std::path::PathBuf;

/// Opaque `exec(argv) -> output` capability.
///
/// Implementations own timeout behaviour; the engine never enforces one.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Runs `argv[0]` with the remaining arguments and returns its stdout.
    /// A non-zero exit status is reported as an error.
    async fn exec(&self, argv: &[String]) -> EngineResult<String>;
}

/// Application settings the restore-point workflows read and update.
pub trait SettingsService: Send + Sync {
    fn current_theme(&self) -> Option<String>;
    fn set_current_theme(&self, name: &str) -> EngineResult<()>;

    fn default_theme_bar(&self) -> Option<String>;
    fn set_default_theme_bar(&self, bar: &str) -> EngineResult<()>;

    fn default_bar_manual(&self) -> bool;
    fn set_default_bar_manual(&self, manual: bool) -> EngineResult<()>;

    fn restore_point_folders(&self) -> Vec<String>;
    fn set_restore_point_folders(&self, folders: &[String]) -> EngineResult<()>;

    fn last_update_timestamp(&self) -> Option<String>;
    fn set_last_update_timestamp(&self, timestamp: &str) -> EngineResult<()>;
}

/// Fan-out of engine notifications to whoever renders them.
pub trait EventBus: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// What the backup script has to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupScriptRequest {
    /// Folders under the user's config directory to capture.
    pub folders: Vec<String>,
    /// Theme that was active when the backup was requested.
    pub source_theme: String,
    /// Directory the script refreshes (the live default theme).
    pub target_dir: PathBuf,
}

/// Supplies the text of the shell script that refreshes the default theme.
pub trait ScriptBuilder: Send + Sync {
    fn build_backup_script(&self, request: &BackupScriptRequest) -> String;
}
