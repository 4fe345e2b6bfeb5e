use crate::common::EngineResult;
use crate::common::fs_util::{read_json, write_json_atomic};
use crate::ports::SettingsService;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
struct SettingsDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    current_theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_theme_bar: Option<String>,
    default_bar_manual: bool,
    restore_point_folders: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_update_timestamp: Option<String>,
}

/// Settings persisted as one JSON document, rewritten atomically on every change.
#[derive(Debug)]
pub struct JsonSettingsStore {
    path: PathBuf,
    document: Mutex<SettingsDocument>,
}

impl JsonSettingsStore {
    /// Loads the settings file; a missing or malformed file yields defaults.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let document = match read_json::<SettingsDocument>(&path) {
            Ok(Some(document)) => document,
            Ok(None) => SettingsDocument::default(),
            Err(e) => {
                log::warn!("Ignoring unreadable settings file: {e}");
                SettingsDocument::default()
            }
        };

        Self {
            path,
            document: Mutex::new(document),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read<R>(&self, f: impl FnOnce(&SettingsDocument) -> R) -> R {
        match self.document.lock() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    fn update(&self, f: impl FnOnce(&mut SettingsDocument)) -> EngineResult<()> {
        let snapshot = {
            let mut guard = match self.document.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            f(&mut guard);
            guard.clone()
        };
        write_json_atomic(&self.path, &snapshot)
    }
}

impl SettingsService for JsonSettingsStore {
    fn current_theme(&self) -> Option<String> {
        self.read(|d| d.current_theme.clone())
    }

    fn set_current_theme(&self, name: &str) -> EngineResult<()> {
        self.update(|d| d.current_theme = Some(name.to_string()))
    }

    fn default_theme_bar(&self) -> Option<String> {
        self.read(|d| d.default_theme_bar.clone())
    }

    fn set_default_theme_bar(&self, bar: &str) -> EngineResult<()> {
        self.update(|d| d.default_theme_bar = Some(bar.to_string()))
    }

    fn default_bar_manual(&self) -> bool {
        self.read(|d| d.default_bar_manual)
    }

    fn set_default_bar_manual(&self, manual: bool) -> EngineResult<()> {
        self.update(|d| d.default_bar_manual = manual)
    }

    fn restore_point_folders(&self) -> Vec<String> {
        self.read(|d| d.restore_point_folders.clone())
    }

    fn set_restore_point_folders(&self, folders: &[String]) -> EngineResult<()> {
        self.update(|d| d.restore_point_folders = folders.to_vec())
    }

    fn last_update_timestamp(&self) -> Option<String> {
        self.read(|d| d.last_update_timestamp.clone())
    }

    fn set_last_update_timestamp(&self, timestamp: &str) -> EngineResult<()> {
        self.update(|d| d.last_update_timestamp = Some(timestamp.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_settings_persist_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = JsonSettingsStore::load(&path);
        store.set_current_theme("nord").unwrap();
        store.set_default_theme_bar("waybar").unwrap();
        store.set_default_bar_manual(true).unwrap();
        store
            .set_restore_point_folders(&["waybar".to_string(), "hypr".to_string()])
            .unwrap();

        let reloaded = JsonSettingsStore::load(&path);
        assert_eq!(reloaded.current_theme().as_deref(), Some("nord"));
        assert_eq!(reloaded.default_theme_bar().as_deref(), Some("waybar"));
        assert!(reloaded.default_bar_manual());
        assert_eq!(reloaded.restore_point_folders(), vec!["waybar", "hypr"]);
    }

    #[test]
    fn test_malformed_settings_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "[[[").unwrap();

        let store = JsonSettingsStore::load(&path);
        assert!(store.current_theme().is_none());
        assert!(!store.default_bar_manual());
    }
}
