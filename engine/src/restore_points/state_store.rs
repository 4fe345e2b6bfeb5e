//! Manifest persistence, reconciliation against the restore-points root, and
//! snapshot creation.

use super::state_paths::{
    DEFAULT_BAR, build_restore_point_id, created_at_from_millis, detect_bar_in_directory,
    is_known_bar, is_trusted_restore_point_id, normalize_bar_name, restore_point_id_millis,
    timestamp_from_millis,
};
use super::tree::{copy_tree, remove_tree};
use super::types::{RestorePointEntry, RestorePointType, RestorePointsState, normalize_folders};
use crate::common::fs_util::{now_millis, read_json, write_json_atomic};
use crate::common::{EngineError, EngineResult};
use crate::layout::EngineLayout;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// A manifest whose newest point is younger than this is trusted.
pub const RECENT_MANIFEST_WINDOW_MS: i64 = 2 * 24 * 60 * 60 * 1000;
/// Slack below the oldest known id when recovering directories.
pub const RECOVERY_LOWER_SLACK_MS: i64 = 1_000;
/// Slack above "now" when recovering directories (clock skew).
pub const RECOVERY_UPPER_SLACK_MS: i64 = 60_000;

/// Options for [`RestorePointStateStore::write_restore_points_state`].
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Merge with the manifest currently on disk instead of replacing it.
    /// Entries passed in overwrite on-disk entries with the same id.
    pub preserve_existing: bool,
    /// Ids dropped from the result regardless of where they came from.
    pub remove_ids: HashSet<String>,
}

impl WriteOptions {
    pub fn preserve() -> Self {
        Self {
            preserve_existing: true,
            ..Self::default()
        }
    }

    pub fn removing(ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            preserve_existing: true,
            remove_ids: ids.into_iter().collect(),
        }
    }
}

/// Inputs for [`RestorePointStateStore::create_restore_point_snapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotRequest {
    /// Directory to copy; `None` means the live default theme.
    pub source_dir: Option<PathBuf>,
    pub kind: RestorePointType,
    pub source_theme: String,
    pub folders: Vec<String>,
    /// Bar chosen by the caller; wins over everything else.
    pub bar: Option<String>,
    /// Bar configured in settings; used when the caller gave none.
    pub configured_bar: Option<String>,
    pub bar_manual: bool,
}

impl SnapshotRequest {
    pub fn new(kind: RestorePointType, source_theme: impl Into<String>) -> Self {
        Self {
            source_dir: None,
            kind,
            source_theme: source_theme.into(),
            folders: Vec::new(),
            bar: None,
            configured_bar: None,
            bar_manual: false,
        }
    }
}

/// Picks the bar to record: caller, then configured default, then a scan of
/// the snapshot. Values that are empty or `none` do not count.
pub fn resolve_snapshot_bar(
    caller: Option<&str>,
    configured: Option<&str>,
    snapshot_dir: &Path,
) -> String {
    let usable = |value: Option<&str>| {
        value
            .map(normalize_bar_name)
            .filter(|bar| bar != DEFAULT_BAR)
    };

    usable(caller)
        .or_else(|| usable(configured))
        .or_else(|| detect_bar_in_directory(snapshot_dir))
        .unwrap_or_else(|| DEFAULT_BAR.to_string())
}

#[derive(Debug, Default)]
struct ManifestRead {
    exists: bool,
    active_id: Option<String>,
    points: Vec<RestorePointEntry>,
}

/// Owns the restore-point manifest and the directories it describes.
#[derive(Debug, Clone)]
pub struct RestorePointStateStore {
    manifest_path: PathBuf,
    restore_points_root: PathBuf,
    default_theme_dir: PathBuf,
}

impl RestorePointStateStore {
    pub fn new(layout: &EngineLayout) -> Self {
        Self {
            manifest_path: layout.manifest_path(),
            restore_points_root: layout.restore_points_root(),
            default_theme_dir: layout.default_theme_dir(),
        }
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn restore_points_root(&self) -> &Path {
        &self.restore_points_root
    }

    pub fn default_theme_dir(&self) -> &Path {
        &self.default_theme_dir
    }

    /// Directory of a restore point. Untrusted ids never map to a path.
    pub fn restore_point_dir(&self, id: &str) -> Option<PathBuf> {
        is_trusted_restore_point_id(id).then(|| self.restore_points_root.join(id))
    }

    fn read_manifest(&self) -> ManifestRead {
        let document = match read_json::<Value>(&self.manifest_path) {
            Ok(Some(document)) => document,
            Ok(None) => return ManifestRead::default(),
            Err(e) => {
                log::warn!("Restore point manifest unreadable, treating as empty: {e}");
                return ManifestRead {
                    exists: true,
                    ..ManifestRead::default()
                };
            }
        };

        let points = document
            .get("points")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(RestorePointEntry::from_value)
                    .collect()
            })
            .unwrap_or_default();

        let active_id = document
            .get("activeId")
            .and_then(Value::as_str)
            .filter(|id| is_trusted_restore_point_id(id))
            .map(str::to_string);

        ManifestRead {
            exists: true,
            active_id,
            points,
        }
    }

    /// Trusted ids of the directories under the restore-points root.
    /// Symbolic links are not counted.
    pub fn list_on_disk_ids(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.restore_points_root) else {
            return Vec::new();
        };

        let mut ids: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| is_trusted_restore_point_id(name))
            .collect();
        ids.sort();
        ids
    }

    /// Reads the manifest and repairs it from the filesystem.
    pub fn read_restore_points_state(&self) -> RestorePointsState {
        self.read_restore_points_state_at(now_millis())
    }

    /// [`Self::read_restore_points_state`] with an explicit clock.
    pub fn read_restore_points_state_at(&self, now_ms: i64) -> RestorePointsState {
        let manifest = self.read_manifest();
        let on_disk = self.list_on_disk_ids();

        // No manifest, or one without usable points: rebuild from directory names.
        let recovered: Vec<&String> = if manifest.points.is_empty() {
            if !manifest.exists {
                log::debug!("No restore point manifest; rebuilding from directories");
            }
            on_disk.iter().collect()
        } else {
            let millis: Vec<i64> = manifest.points.iter().map(|p| p.id_millis()).collect();
            let oldest = millis.iter().copied().min().unwrap_or(now_ms);
            let newest = millis.iter().copied().max().unwrap_or(now_ms);

            if now_ms - newest <= RECENT_MANIFEST_WINDOW_MS {
                let lower = oldest - RECOVERY_LOWER_SLACK_MS;
                let upper = now_ms + RECOVERY_UPPER_SLACK_MS;
                on_disk
                    .iter()
                    .filter(|id| {
                        restore_point_id_millis(id).is_some_and(|ms| ms >= lower && ms <= upper)
                    })
                    .collect()
            } else {
                on_disk.iter().collect()
            }
        };

        let known: HashSet<&str> = manifest.points.iter().map(|p| p.id.as_str()).collect();
        let additions: Vec<RestorePointEntry> = recovered
            .into_iter()
            .filter(|id| !known.contains(id.as_str()))
            .filter_map(|id| RestorePointEntry::fallback_for_id(id))
            .collect();

        if !additions.is_empty() {
            log::info!(
                "Recovered {} restore point(s) from {}",
                additions.len(),
                self.restore_points_root.display()
            );
        }

        let mut points = manifest.points;
        points.extend(additions);
        RestorePointsState::new(points, manifest.active_id)
    }

    /// Writes the manifest atomically and returns what was written.
    pub fn write_restore_points_state(
        &self,
        state: &RestorePointsState,
        options: &WriteOptions,
    ) -> EngineResult<RestorePointsState> {
        let mut active_id = state.active_id.clone();
        let mut points: Vec<RestorePointEntry> = if options.preserve_existing {
            let existing = self.read_manifest();
            if active_id.is_none() {
                active_id = existing.active_id;
            }

            let incoming: HashMap<&str, &RestorePointEntry> =
                state.points.iter().map(|p| (p.id.as_str(), p)).collect();
            let mut merged: Vec<RestorePointEntry> = existing
                .points
                .into_iter()
                .filter(|p| !incoming.contains_key(p.id.as_str()))
                .collect();
            merged.extend(state.points.iter().cloned());
            merged
        } else {
            state.points.clone()
        };

        points.retain(|p| !options.remove_ids.contains(&p.id));
        let points: Vec<RestorePointEntry> =
            points.iter().filter_map(RestorePointEntry::standardize).collect();
        if active_id
            .as_ref()
            .is_some_and(|id| options.remove_ids.contains(id))
        {
            active_id = None;
        }

        let next = RestorePointsState::new(points, active_id);
        write_json_atomic(&self.manifest_path, &next)?;
        log::debug!(
            "Wrote restore point manifest with {} point(s)",
            next.points.len()
        );
        Ok(next)
    }

    /// Inserts or replaces one entry, keeping everything else on disk.
    pub fn upsert_restore_point(
        &self,
        entry: &RestorePointEntry,
        make_active: bool,
    ) -> EngineResult<RestorePointsState> {
        let entry = entry
            .standardize()
            .ok_or_else(|| EngineError::UntrustedId(entry.id.clone()))?;

        let current = self.read_restore_points_state();
        let mut points = current.points;
        match points.iter_mut().find(|p| p.id == entry.id) {
            Some(existing) => *existing = entry.clone(),
            None => points.push(entry.clone()),
        }

        let active_id = if make_active {
            Some(entry.id.clone())
        } else {
            current.active_id
        };
        self.write_restore_points_state(&RestorePointsState::new(points, active_id), &WriteOptions::preserve())
    }

    /// Marks `id` active. Returns `Ok(false)` for ids not in the manifest.
    pub fn set_active_restore_point_id(&self, id: &str) -> EngineResult<bool> {
        if !is_trusted_restore_point_id(id) {
            return Err(EngineError::UntrustedId(id.to_string()));
        }

        let mut state = self.read_restore_points_state();
        if !state.contains(id) {
            return Ok(false);
        }
        state.active_id = Some(id.to_string());
        self.write_restore_points_state(&state, &WriteOptions::default())?;
        Ok(true)
    }

    pub fn find_restore_point(&self, id: &str) -> Option<RestorePointEntry> {
        if !is_trusted_restore_point_id(id) {
            return None;
        }
        self.read_restore_points_state().find(id).cloned()
    }

    /// Copies the source directory into a fresh id-named restore point and
    /// builds its entry. The manifest is not touched.
    ///
    /// Returns `None` when the source is missing or nothing usable was left
    /// on disk; a partially created directory is removed.
    pub fn create_restore_point_snapshot(&self, request: &SnapshotRequest) -> Option<RestorePointEntry> {
        let source = request
            .source_dir
            .clone()
            .unwrap_or_else(|| self.default_theme_dir.clone());
        if !source.is_dir() {
            log::warn!("Snapshot source {} does not exist", source.display());
            return None;
        }

        let id = build_restore_point_id();
        let target = self.restore_point_dir(&id)?;
        if let Err(e) = fs::create_dir_all(&self.restore_points_root) {
            log::error!("Cannot create {}: {e}", self.restore_points_root.display());
            return None;
        }

        match copy_tree(&source, &target) {
            Ok(report) if !report.is_complete() => {
                log::warn!(
                    "Restore point {id} copied with {} failed entr(ies)",
                    report.failed
                );
            }
            Ok(report) => {
                log::debug!("Restore point {id}: {} files, {} dirs", report.files, report.dirs);
            }
            Err(e) => {
                log::error!("Failed to copy {} into {id}: {e}", source.display());
                let _ = remove_tree(&target);
                return None;
            }
        }

        if !target.is_dir() {
            return None;
        }

        let bar = resolve_snapshot_bar(
            request.bar.as_deref(),
            request.configured_bar.as_deref(),
            &target,
        );
        if bar != DEFAULT_BAR && !is_known_bar(&bar) {
            log::debug!("Recording unrecognised bar '{bar}' for {id}");
        }

        let millis = restore_point_id_millis(&id)?;
        let entry = RestorePointEntry {
            id: id.clone(),
            created_at: created_at_from_millis(millis),
            timestamp: timestamp_from_millis(millis),
            source_theme: request.source_theme.clone(),
            kind: request.kind,
            default_theme_bar: bar,
            default_bar_manual: request.bar_manual,
            selected_folders: normalize_folders(&request.folders),
        }
        .standardize();

        if entry.is_none() {
            let _ = remove_tree(&target);
        }
        entry
    }
}
