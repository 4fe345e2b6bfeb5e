//! Read/write access into restore-point subtrees and the size tree listing.
//!
//! Every relative path is cleaned and the resulting absolute target is
//! checked against its restore-point directory before any I/O happens.

use super::state_paths::is_path_in_directory;
use super::state_store::RestorePointStateStore;
use super::types::{RestorePointTreeNode, TreeNodeType};
use crate::common::{EngineError, EngineResult};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Node budget for [`build_restore_point_tree_node`] when the caller has none.
pub const DEFAULT_TREE_NODE_LIMIT: usize = 20_000;
/// Files above this size are not loaded as text.
pub const MAX_TEXT_FILE_BYTES: u64 = 4 * 1024 * 1024;
const TRUNCATED_NODE_NAME: &str = "…";

/// Human readable size, e.g. `1.50 KB`.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Normalizes separators and strips leading/trailing slashes.
///
/// Any `.` or `..` segment rejects the whole path; empty segments from
/// doubled slashes are dropped. An empty result means the restore-point root.
pub fn clean_relative_path(raw: &str) -> EngineResult<String> {
    let normalized = raw.replace('\\', "/");
    let mut segments = Vec::new();
    for segment in normalized.split('/') {
        match segment {
            "" => continue,
            "." | ".." => return Err(EngineError::InvalidRelativePath(raw.to_string())),
            s if s.contains('\0') => return Err(EngineError::InvalidRelativePath(raw.to_string())),
            s => segments.push(s),
        }
    }
    Ok(segments.join("/"))
}

fn restore_point_root(store: &RestorePointStateStore, id: &str) -> EngineResult<PathBuf> {
    let dir = store
        .restore_point_dir(id)
        .ok_or_else(|| EngineError::UntrustedId(id.to_string()))?;
    if !dir.is_dir() {
        return Err(EngineError::NotFound(dir));
    }
    if !is_path_in_directory(&dir, store.restore_points_root()) {
        return Err(EngineError::PathOutsideRoot {
            path: dir,
            root: store.restore_points_root().to_path_buf(),
        });
    }
    Ok(dir)
}

fn ensure_inside(path: &Path, root: &Path) -> EngineResult<()> {
    if is_path_in_directory(path, root) {
        Ok(())
    } else {
        Err(EngineError::PathOutsideRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })
    }
}

fn resolve_target(
    store: &RestorePointStateStore,
    id: &str,
    relative_path: &str,
) -> EngineResult<(PathBuf, PathBuf)> {
    let root = restore_point_root(store, id)?;
    let cleaned = clean_relative_path(relative_path)?;
    let target = if cleaned.is_empty() {
        root.clone()
    } else {
        root.join(&cleaned)
    };
    ensure_inside(&target, &root)?;
    Ok((root, target))
}

/// Absolute path of `relative_path` inside restore point `id`, or `None`
/// when the id is untrusted, the point is missing or the path escapes it.
pub fn build_restore_point_target(
    store: &RestorePointStateStore,
    id: &str,
    relative_path: &str,
) -> Option<PathBuf> {
    match resolve_target(store, id, relative_path) {
        Ok((_, target)) => Some(target),
        Err(e) => {
            log::debug!("Rejected restore point target {id}/{relative_path}: {e}");
            None
        }
    }
}

pub fn get_restore_point_file_text(
    store: &RestorePointStateStore,
    id: &str,
    relative_path: &str,
) -> Option<String> {
    let target = build_restore_point_target(store, id, relative_path)?;
    let meta = fs::metadata(&target).ok()?;
    if !meta.is_file() || meta.len() > MAX_TEXT_FILE_BYTES {
        return None;
    }
    match fs::read(&target) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            log::warn!("Failed to read {}: {e}", target.display());
            None
        }
    }
}

/// Writes `text` to an existing or new file whose parent already exists.
pub fn set_restore_point_file_text(
    store: &RestorePointStateStore,
    id: &str,
    relative_path: &str,
    text: &str,
) -> EngineResult<()> {
    let (root, target) = resolve_target(store, id, relative_path)?;
    if target == root || target.is_dir() {
        return Err(EngineError::InvalidRelativePath(relative_path.to_string()));
    }
    let parent = target
        .parent()
        .ok_or_else(|| EngineError::InvalidRelativePath(relative_path.to_string()))?;
    if !parent.is_dir() {
        return Err(EngineError::NotFound(parent.to_path_buf()));
    }

    fs::write(&target, text).map_err(|e| EngineError::io(&target, e))?;
    log::info!("Updated {} in restore point {id}", target.display());
    Ok(())
}

pub fn create_restore_point_folder(
    store: &RestorePointStateStore,
    id: &str,
    relative_path: &str,
) -> EngineResult<PathBuf> {
    let (root, target) = resolve_target(store, id, relative_path)?;
    if target == root {
        return Err(EngineError::InvalidRelativePath(relative_path.to_string()));
    }
    fs::create_dir_all(&target).map_err(|e| EngineError::io(&target, e))?;
    // An intermediate symlink created concurrently would only show up now.
    ensure_inside(&target, &root)?;
    Ok(target)
}

fn pump_bytes(source: &Path, destination: &Path) -> EngineResult<u64> {
    let mut reader = fs::File::open(source).map_err(|e| EngineError::io(source, e))?;
    let mut buffer = Vec::new();
    reader
        .read_to_end(&mut buffer)
        .map_err(|e| EngineError::io(source, e))?;
    let mut writer = fs::File::create(destination).map_err(|e| EngineError::io(destination, e))?;
    writer
        .write_all(&buffer)
        .map_err(|e| EngineError::io(destination, e))?;
    Ok(buffer.len() as u64)
}

/// Copies, falling back to read-then-write when `fs::copy` fails (some
/// cross-filesystem and permission setups).
fn copy_file_with_fallback(source: &Path, destination: &Path) -> EngineResult<u64> {
    match fs::copy(source, destination) {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            log::debug!(
                "fs::copy {} -> {} failed ({e}); retrying with byte pump",
                source.display(),
                destination.display()
            );
            pump_bytes(source, destination)
        }
    }
}

/// Copies an outside file into folder `relative_dir` of restore point `id`.
pub fn import_file_into_restore_point(
    store: &RestorePointStateStore,
    id: &str,
    source_file: &Path,
    relative_dir: &str,
) -> EngineResult<PathBuf> {
    let (root, target_dir) = resolve_target(store, id, relative_dir)?;
    if !target_dir.is_dir() {
        return Err(EngineError::NotFound(target_dir));
    }
    if !source_file.is_file() {
        return Err(EngineError::NotFound(source_file.to_path_buf()));
    }

    let file_name = source_file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| EngineError::InvalidRelativePath(source_file.display().to_string()))?;
    let cleaned = clean_relative_path(file_name)?;
    let destination = target_dir.join(cleaned);
    ensure_inside(&destination, &root)?;

    copy_file_with_fallback(source_file, &destination)?;
    log::info!(
        "Imported {} into restore point {id}",
        source_file.display()
    );
    Ok(destination)
}

/// Rejects export destinations the engine itself manages: anything under the
/// restore-points root or the live default theme, and the manifest file.
fn ensure_export_destination(store: &RestorePointStateStore, destination: &Path) -> EngineResult<PathBuf> {
    let destination = std::path::absolute(destination).map_err(|e| EngineError::io(destination, e))?;
    for managed in [store.restore_points_root(), store.default_theme_dir()] {
        if is_path_in_directory(&destination, managed) {
            return Err(EngineError::PathOutsideRoot {
                path: destination,
                root: managed.to_path_buf(),
            });
        }
    }
    if is_path_in_directory(&destination, store.manifest_path()) {
        return Err(EngineError::PathOutsideRoot {
            path: destination,
            root: store.manifest_path().to_path_buf(),
        });
    }
    Ok(destination)
}

/// Copies a file out of restore point `id` to `destination`, which must lie
/// outside the directories the engine manages.
pub fn export_restore_point_file(
    store: &RestorePointStateStore,
    id: &str,
    relative_path: &str,
    destination: &Path,
) -> EngineResult<u64> {
    let (_, source) = resolve_target(store, id, relative_path)?;
    if !source.is_file() {
        return Err(EngineError::NotFound(source));
    }
    let destination = ensure_export_destination(store, destination)?;
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| EngineError::io(parent, e))?;
    }
    copy_file_with_fallback(&source, &destination)
}

struct TreeWalk {
    max_nodes: usize,
    visited: usize,
    truncated: bool,
}

impl TreeWalk {
    fn truncated_node() -> RestorePointTreeNode {
        RestorePointTreeNode {
            name: TRUNCATED_NODE_NAME.to_string(),
            node_type: TreeNodeType::Truncated,
            size: 0,
            size_label: String::new(),
            children: Vec::new(),
        }
    }

    fn file_node(name: String, size: u64) -> RestorePointTreeNode {
        RestorePointTreeNode {
            name,
            node_type: TreeNodeType::File,
            size,
            size_label: format_bytes(size),
            children: Vec::new(),
        }
    }

    fn folder(&mut self, name: String, path: &Path) -> RestorePointTreeNode {
        let mut entries: Vec<(bool, String, PathBuf, u64)> = match fs::read_dir(path) {
            Ok(entries) => entries
                .flatten()
                .filter_map(|entry| {
                    let meta = fs::symlink_metadata(entry.path()).ok()?;
                    let name = entry.file_name().to_string_lossy().into_owned();
                    Some((meta.is_dir(), name, entry.path(), meta.len()))
                })
                .collect(),
            Err(e) => {
                log::debug!("Cannot list {}: {e}", path.display());
                Vec::new()
            }
        };
        entries.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        let mut children = Vec::new();
        for (is_dir, child_name, child_path, len) in entries {
            if self.truncated {
                break;
            }
            if self.visited >= self.max_nodes {
                self.truncated = true;
                children.push(Self::truncated_node());
                break;
            }
            self.visited += 1;
            children.push(if is_dir {
                self.folder(child_name, &child_path)
            } else {
                Self::file_node(child_name, len)
            });
        }

        let size = children.iter().map(|c| c.size).sum();
        RestorePointTreeNode {
            name,
            node_type: TreeNodeType::Folder,
            size,
            size_label: format_bytes(size),
            children,
        }
    }
}

/// Builds a size tree of `path`; children are folders first, then by name.
///
/// Once `max_nodes` nodes have been produced the walk stops and a single
/// `truncated` node marks where. Returns `None` when `path` does not exist.
pub fn build_restore_point_tree_node(path: &Path, max_nodes: Option<usize>) -> Option<RestorePointTreeNode> {
    let meta = fs::symlink_metadata(path).ok()?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if !meta.is_dir() {
        return Some(TreeWalk::file_node(name, meta.len()));
    }

    let mut walk = TreeWalk {
        max_nodes: max_nodes.unwrap_or(DEFAULT_TREE_NODE_LIMIT).max(1),
        visited: 1,
        truncated: false,
    };
    Some(walk.folder(name, path))
}

/// Size tree of restore point `id`.
pub fn get_restore_point_tree(
    store: &RestorePointStateStore,
    id: &str,
    max_nodes: Option<usize>,
) -> Option<RestorePointTreeNode> {
    let root = restore_point_root(store, id).ok()?;
    build_restore_point_tree_node(&root, max_nodes)
}
