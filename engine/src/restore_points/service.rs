use super::files;
use super::runtime;
use super::state_store::RestorePointStateStore;
use super::types::RestorePointTreeNode;
use crate::common::EngineResult;
use crate::layout::{EngineLayout, EngineOptions};
use crate::ports::{CommandExecutor, EventBus, ScriptBuilder, SettingsService};
use crate::state::EngineState;
use crate::theme::ThemeRepository;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// External capabilities the restore-point workflows run against.
#[derive(Clone)]
pub struct Collaborators {
    pub executor: Arc<dyn CommandExecutor>,
    pub settings: Arc<dyn SettingsService>,
    pub events: Arc<dyn EventBus>,
    pub scripts: Arc<dyn ScriptBuilder>,
}

/// Restore-point workflows: creation, restore, deletion, browsing and the
/// settings glue around them.
///
/// Public methods never fail loudly. Missing targets, untrusted ids and
/// I/O problems come back as `None`/`false` after being logged.
pub struct RestorePointService {
    pub(super) store: RestorePointStateStore,
    pub(super) themes: Arc<ThemeRepository>,
    pub(super) state: Arc<EngineState>,
    pub(super) options: EngineOptions,
    pub(super) scratch_dir: PathBuf,
    pub(super) executor: Arc<dyn CommandExecutor>,
    pub(super) settings: Arc<dyn SettingsService>,
    pub(super) events: Arc<dyn EventBus>,
    pub(super) scripts: Arc<dyn ScriptBuilder>,
}

/// Logs `Err` and collapses the result into an `Option`.
pub(super) fn logged<T>(operation: &str, result: EngineResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("{operation} failed: {e}");
            None
        }
    }
}

impl RestorePointService {
    pub fn new(
        layout: &EngineLayout,
        options: EngineOptions,
        themes: Arc<ThemeRepository>,
        state: Arc<EngineState>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            store: RestorePointStateStore::new(layout),
            themes,
            state,
            options,
            scratch_dir: layout.temp_root.clone(),
            executor: collaborators.executor,
            settings: collaborators.settings,
            events: collaborators.events,
            scripts: collaborators.scripts,
        }
    }

    pub fn store(&self) -> &RestorePointStateStore {
        &self.store
    }

    pub fn engine_state(&self) -> &EngineState {
        &self.state
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Time of the last restore or snapshot, from memory or settings.
    pub fn last_update_timestamp(&self) -> Option<String> {
        self.state
            .last_update_timestamp()
            .or_else(|| self.settings.last_update_timestamp())
    }

    pub fn build_restore_point_target(&self, id: &str, relative_path: &str) -> Option<PathBuf> {
        files::build_restore_point_target(&self.store, id, relative_path)
    }

    pub fn get_restore_point_file_text(&self, id: &str, relative_path: &str) -> Option<String> {
        files::get_restore_point_file_text(&self.store, id, relative_path)
    }

    pub fn set_restore_point_file_text(&self, id: &str, relative_path: &str, text: &str) -> bool {
        logged(
            "Writing restore point file",
            files::set_restore_point_file_text(&self.store, id, relative_path, text),
        )
        .is_some()
    }

    pub fn create_restore_point_folder(&self, id: &str, relative_path: &str) -> Option<PathBuf> {
        logged(
            "Creating restore point folder",
            files::create_restore_point_folder(&self.store, id, relative_path),
        )
    }

    pub fn import_file_into_restore_point(
        &self,
        id: &str,
        source_file: &Path,
        relative_dir: &str,
    ) -> Option<PathBuf> {
        logged(
            "Importing into restore point",
            files::import_file_into_restore_point(&self.store, id, source_file, relative_dir),
        )
    }

    pub fn export_restore_point_file(&self, id: &str, relative_path: &str, destination: &Path) -> bool {
        logged(
            "Exporting restore point file",
            files::export_restore_point_file(&self.store, id, relative_path, destination),
        )
        .is_some()
    }

    /// Size tree of a restore point; `None` uses the configured node limit.
    pub fn get_restore_point_tree(&self, id: &str, max_nodes: Option<usize>) -> Option<RestorePointTreeNode> {
        let limit = max_nodes.unwrap_or(self.options.tree_node_limit);
        files::get_restore_point_tree(&self.store, id, Some(limit))
    }

    /// Probes running processes for a known bar. A bar that is found is
    /// remembered; a probe that finds none leaves the last one in place.
    pub async fn detect_running_bar(&self) -> Option<String> {
        let bar = runtime::detect_running_bar(self.executor.as_ref()).await;
        if bar.is_some() {
            self.state.set_detected_bar(bar.clone());
        }
        bar
    }

    pub fn sync_theme_to_settings(&self, theme: &str, bar: Option<&str>, manual: bool) -> bool {
        logged(
            "Syncing theme to settings",
            runtime::sync_theme_to_settings(self.settings.as_ref(), &self.state, theme, bar, manual),
        )
        .is_some()
    }

    pub fn set_default_theme_bar(&self, bar: &str, manual: bool) -> bool {
        logged(
            "Saving default bar",
            runtime::set_default_theme_bar(self.settings.as_ref(), bar, manual),
        )
        .is_some()
    }
}
