//! Recursive copy and removal of directory trees.

use crate::common::{EngineError, EngineResult};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Outcome of a best-effort [`copy_tree`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyReport {
    pub files: usize,
    pub dirs: usize,
    /// Symbolic links and special files that were not copied.
    pub skipped: usize,
    /// Children that failed to copy; the rest of the tree was still copied.
    pub failed: usize,
}

impl CopyReport {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Copies regular files and directories from `source` into `target`.
///
/// Symbolic links are skipped, never followed. A child that fails to copy is
/// counted and the walk continues. Only a missing or unreadable `source`
/// root, or a `target` root that cannot be created, is an error.
pub fn copy_tree(source: &Path, target: &Path) -> EngineResult<CopyReport> {
    let root_meta = fs::symlink_metadata(source).map_err(|e| EngineError::io(source, e))?;
    if !root_meta.is_dir() {
        return Err(EngineError::NotFound(source.to_path_buf()));
    }
    fs::create_dir_all(target).map_err(|e| EngineError::io(target, e))?;

    let mut report = CopyReport {
        dirs: 1,
        ..CopyReport::default()
    };

    for entry in WalkDir::new(source).follow_links(false).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {e}", source.display());
                report.failed += 1;
                continue;
            }
        };

        let Ok(relative) = entry.path().strip_prefix(source) else {
            report.failed += 1;
            continue;
        };
        let destination = target.join(relative);
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            log::debug!("Skipping symlink {}", entry.path().display());
            report.skipped += 1;
        } else if file_type.is_dir() {
            match fs::create_dir_all(&destination) {
                Ok(()) => report.dirs += 1,
                Err(e) => {
                    log::warn!("Failed to create {}: {e}", destination.display());
                    report.failed += 1;
                }
            }
        } else if file_type.is_file() {
            match fs::copy(entry.path(), &destination) {
                Ok(_) => report.files += 1,
                Err(e) => {
                    log::warn!(
                        "Failed to copy {} -> {}: {e}",
                        entry.path().display(),
                        destination.display()
                    );
                    report.failed += 1;
                }
            }
        } else {
            report.skipped += 1;
        }
    }

    Ok(report)
}

/// Removes `path` and everything below it. A missing path is success.
pub fn remove_tree(path: &Path) -> EngineResult<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(EngineError::io(path, e)),
    };

    let result = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(EngineError::io(path, e)),
    }
}
