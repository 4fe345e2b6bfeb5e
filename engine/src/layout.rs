//! Base directories and tunables the engine runs with.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the theme whose directory holds the live configuration.
pub const DEFAULT_THEME_NAME: &str = "default";

const APP_DIR: &str = "lastlayer";
const THEMES_DIR: &str = "themes";
const RESTORE_POINTS_DIR: &str = "restore_points";
const MANIFEST_FILE: &str = "restore_points.json";
const SETTINGS_FILE: &str = "settings.json";

/// Where everything lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineLayout {
    /// Directory containing one sub-directory per theme.
    pub themes_root: PathBuf,
    /// Preferences directory (manifest, settings, overrides, restore points).
    pub prefs_dir: PathBuf,
    /// Cache directory (theme icons).
    pub cache_dir: PathBuf,
    /// Scratch space for per-theme temp dirs and generated scripts.
    pub temp_root: PathBuf,
}

impl EngineLayout {
    pub fn new(
        themes_root: impl Into<PathBuf>,
        prefs_dir: impl Into<PathBuf>,
        cache_dir: impl Into<PathBuf>,
        temp_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            themes_root: themes_root.into(),
            prefs_dir: prefs_dir.into(),
            cache_dir: cache_dir.into(),
            temp_root: temp_root.into(),
        }
    }

    /// Layout rooted in the user's XDG directories.
    pub fn from_user_dirs() -> Self {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        let cache_dir = dirs::cache_dir().unwrap_or_else(|| config_dir.join(".cache"));

        Self {
            themes_root: config_dir.join(THEMES_DIR),
            prefs_dir: config_dir.join(APP_DIR),
            cache_dir: cache_dir.join(APP_DIR),
            temp_root: std::env::temp_dir(),
        }
    }

    /// Everything under one directory; used by tests and portable setups.
    pub fn rooted_at(root: &Path) -> Self {
        Self::new(
            root.join(THEMES_DIR),
            root.join("prefs"),
            root.join("cache"),
            root.join("tmp"),
        )
    }

    /// The live theme directory that restore points are taken of.
    pub fn default_theme_dir(&self) -> PathBuf {
        self.themes_root.join(DEFAULT_THEME_NAME)
    }

    pub fn restore_points_root(&self) -> PathBuf {
        self.prefs_dir.join(RESTORE_POINTS_DIR)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.prefs_dir.join(MANIFEST_FILE)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.prefs_dir.join(SETTINGS_FILE)
    }
}

/// Tunables with the defaults the engine ships with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub theme_cache_ttl: Duration,
    pub monitor_debounce: Duration,
    pub tree_node_limit: usize,
    pub list_batch_size: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            theme_cache_ttl: Duration::from_secs(30),
            monitor_debounce: Duration::from_millis(300),
            tree_node_limit: 20_000,
            list_batch_size: 8,
        }
    }
}
