//! Snapshot, restore and delete workflows.

use super::scripts::run_backup_script;
use super::service::{RestorePointService, logged};
use super::state_paths::{detect_bar_in_directory, is_path_in_directory, is_trusted_restore_point_id};
use super::state_store::{SnapshotRequest, WriteOptions};
use super::tree::{copy_tree, remove_tree};
use super::types::{RestorePointEntry, RestorePointType, normalize_folders};
use crate::layout::DEFAULT_THEME_NAME;
use crate::ports::{BackupScriptRequest, EngineEvent};

impl RestorePointService {
    pub fn list_restore_points(&self) -> Vec<RestorePointEntry> {
        self.store.read_restore_points_state().points
    }

    pub fn get_active_restore_point(&self) -> Option<RestorePointEntry> {
        let state = self.store.read_restore_points_state();
        let active = state.active_id.as_deref()?;
        state.find(active).cloned()
    }

    fn record_new_point(&self, entry: RestorePointEntry) -> Option<RestorePointEntry> {
        if let Err(e) = self.store.upsert_restore_point(&entry, true) {
            log::error!("Could not record restore point {}: {e}", entry.id);
            if let Some(dir) = self.store.restore_point_dir(&entry.id) {
                let _ = remove_tree(&dir);
            }
            return None;
        }

        self.state.set_last_update_timestamp(entry.timestamp.clone());
        if let Err(e) = self.settings.set_last_update_timestamp(&entry.timestamp) {
            log::warn!("Could not store last update time: {e}");
        }
        self.events.emit(EngineEvent::RestorePointsChanged);
        self.events.emit(EngineEvent::RestorePointDisplayUpdated {
            id: entry.id.clone(),
            timestamp: entry.timestamp.clone(),
        });
        log::info!(
            "Created {} restore point {} from theme '{}'",
            entry.kind.as_str(),
            entry.id,
            entry.source_theme
        );
        Some(entry)
    }

    /// Refreshes the live default theme from the selected config folders and
    /// snapshots it.
    ///
    /// When the refresh fails the current default theme is snapshotted as is,
    /// with the bar taken from the running processes, or the last one seen
    /// running when none is found now.
    pub async fn create_manual_restore_point(
        &self,
        folders: &[String],
        source_theme: &str,
    ) -> Option<RestorePointEntry> {
        let mut folders = normalize_folders(folders);
        if folders.is_empty() {
            folders = normalize_folders(&self.settings.restore_point_folders());
        } else if let Err(e) = self.settings.set_restore_point_folders(&folders) {
            log::warn!("Could not remember folder selection: {e}");
        }

        let script_request = BackupScriptRequest {
            folders: folders.clone(),
            source_theme: source_theme.to_string(),
            target_dir: self.store.default_theme_dir().to_path_buf(),
        };
        let refreshed = run_backup_script(
            self.executor.as_ref(),
            self.scripts.as_ref(),
            &script_request,
            &self.scratch_dir,
        )
        .await;

        let mut request = SnapshotRequest::new(RestorePointType::Manual, source_theme);
        request.folders = folders;
        request.configured_bar = self.settings.default_theme_bar();
        request.bar_manual = self.settings.default_bar_manual();
        if let Err(e) = refreshed {
            log::warn!("Backup script failed, snapshotting the existing default theme: {e}");
            request.bar = self
            .detect_running_bar()
            .await
            .or_else(|| self.state.detected_bar());
        }

        let entry = self.store.create_restore_point_snapshot(&request)?;
        self.record_new_point(entry)
    }

    /// Snapshots the default theme as it is, before another theme replaces
    /// it.
    pub fn create_automatic_restore_point(&self, source_theme: &str) -> Option<RestorePointEntry> {
        let mut request = SnapshotRequest::new(RestorePointType::Automatic, source_theme);
        request.folders = self.settings.restore_point_folders();
        request.configured_bar = self.settings.default_theme_bar();
        request.bar_manual = self.settings.default_bar_manual();

        let entry = self.store.create_restore_point_snapshot(&request)?;
        self.record_new_point(entry)
    }

    /// Replaces the live default theme with the contents of restore point
    /// `id` and points settings back at it.
    ///
    /// Unknown or untrusted ids return `None` without touching the
    /// filesystem. Later settings writes are best-effort and not rolled back.
    pub fn restore_restore_point(&self, id: &str) -> Option<RestorePointEntry> {
        if !is_trusted_restore_point_id(id) {
            log::warn!("Refusing to restore untrusted id {id:?}");
            return None;
        }
        let entry = self.store.find_restore_point(id)?;
        let source = self.store.restore_point_dir(id)?;
        if !source.is_dir() || !is_path_in_directory(&source, self.store.restore_points_root()) {
            log::warn!("Restore point {id} has no directory");
            return None;
        }

        let live = self.store.default_theme_dir().to_path_buf();
        logged("Clearing default theme", remove_tree(&live))?;
        let report = logged("Restoring snapshot", copy_tree(&source, &live))?;
        if !report.is_complete() {
            log::warn!("Restore of {id} skipped {} failed entr(ies)", report.failed);
        }

        let bar = detect_bar_in_directory(&live).unwrap_or_else(|| entry.default_theme_bar.clone());
        self.sync_theme_to_settings(DEFAULT_THEME_NAME, Some(&bar), entry.default_bar_manual);
        if !entry.selected_folders.is_empty() {
            if let Err(e) = self.settings.set_restore_point_folders(&entry.selected_folders) {
                log::warn!("Could not restore folder selection: {e}");
            }
        }
        logged("Marking restore point active", self.store.set_active_restore_point_id(id));

        self.themes.invalidate();
        self.events.emit(EngineEvent::RestorePointRestored { id: id.to_string() });
        self.events.emit(EngineEvent::RestorePointsChanged);
        self.events.emit(EngineEvent::ThemesChanged);
        log::info!("Restored restore point {id}");
        Some(entry)
    }

    /// Removes a restore point's directory and manifest entry.
    ///
    /// The id must be trusted, listed in the manifest and resolve inside
    /// the restore-points root.
    pub fn delete_restore_point(&self, id: &str) -> bool {
        if !is_trusted_restore_point_id(id) {
            log::warn!("Refusing to delete untrusted id {id:?}");
            return false;
        }
        if !self.store.read_restore_points_state().contains(id) {
            return false;
        }
        let Some(dir) = self.store.restore_point_dir(id) else {
            return false;
        };
        let root = self.store.restore_points_root();
        if dir == root || !is_path_in_directory(&dir, root) {
            log::error!("Restore point {id} resolves outside {}", root.display());
            return false;
        }

        if logged("Removing restore point directory", remove_tree(&dir)).is_none() {
            return false;
        }
        let written = logged(
            "Updating manifest",
            self.store.write_restore_points_state(
                &Default::default(),
                &WriteOptions::removing([id.to_string()]),
            ),
        );
        if written.is_none() {
            return false;
        }

        self.events.emit(EngineEvent::RestorePointsChanged);
        log::info!("Deleted restore point {id}");
        true
    }
}
