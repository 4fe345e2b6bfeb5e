//! Every file and directory that belongs to a theme, derived from its name.

use super::validation::{ThemeNameValidator, Validator};
use crate::common::{EngineError, EngineResult};
use crate::layout::{DEFAULT_THEME_NAME, EngineLayout};
use crate::restore_points::tree::remove_tree;
use std::fs;
use std::path::PathBuf;

const METADATA_FILE: &str = "lastlayer.json";
const LEGACY_METADATA_FILE: &str = "metadata.json";
const OVERRIDES_DIR: &str = "theme-overrides";
const LEGACY_OVERRIDES_DIR: &str = ".lastlayer";
const LEGACY_OVERRIDES_FILE: &str = "overrides.json";
const BACKUP_DIR: &str = ".backup";
const ICONS_DIR: &str = "icons";
const PREVIEW_FILE: &str = "preview.png";
const TEMP_PREFIX: &str = "lastlayer-";

/// Resolved paths for one theme. Pure function of (name, layout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemePaths {
    pub name: String,
    pub theme_dir: PathBuf,
    pub metadata_file: PathBuf,
    pub legacy_metadata_file: PathBuf,
    pub overrides_file: PathBuf,
    pub legacy_overrides_file: PathBuf,
    pub backup_dir: PathBuf,
    pub cache_icon: PathBuf,
    pub preview_file: PathBuf,
    pub temp_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ThemePathResolver {
    layout: EngineLayout,
}

impl ThemePathResolver {
    pub fn new(layout: EngineLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &EngineLayout {
        &self.layout
    }

    /// Derives all paths for `name`, rejecting names that are not safe
    /// directory names.
    pub fn resolve(&self, name: &str) -> EngineResult<ThemePaths> {
        ThemeNameValidator.validate(name)?;

        let theme_dir = self.layout.themes_root.join(name);
        Ok(ThemePaths {
            name: name.to_string(),
            metadata_file: theme_dir.join(METADATA_FILE),
            legacy_metadata_file: theme_dir.join(LEGACY_METADATA_FILE),
            overrides_file: self
                .layout
                .prefs_dir
                .join(OVERRIDES_DIR)
                .join(format!("{name}.json")),
            legacy_overrides_file: theme_dir
                .join(LEGACY_OVERRIDES_DIR)
                .join(LEGACY_OVERRIDES_FILE),
            backup_dir: theme_dir.join(BACKUP_DIR),
            cache_icon: self
                .layout
                .cache_dir
                .join(ICONS_DIR)
                .join(format!("{name}.png")),
            preview_file: theme_dir.join(PREVIEW_FILE),
            temp_dir: self.layout.temp_root.join(format!("{TEMP_PREFIX}{name}")),
            theme_dir,
        })
    }

    /// Removes a theme and everything the engine stores about it.
    ///
    /// Returns `Ok(false)` when there was no theme directory to delete.
    pub fn delete_theme(&self, name: &str) -> EngineResult<bool> {
        if name == DEFAULT_THEME_NAME {
            return Err(EngineError::InvalidThemeName {
                name: name.to_string(),
                reason: "The default theme holds the live configuration".to_string(),
            });
        }

        let paths = self.resolve(name)?;
        let existed = fs::symlink_metadata(&paths.theme_dir).is_ok();

        remove_tree(&paths.theme_dir)?;
        remove_tree(&paths.temp_dir)?;
        for file in [&paths.overrides_file, &paths.cache_icon] {
            match fs::remove_file(file) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(EngineError::io(file, e)),
            }
        }

        if existed {
            log::info!("Deleted theme '{name}' at {}", paths.theme_dir.display());
        }
        Ok(existed)
    }
}
