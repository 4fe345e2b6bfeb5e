//! Small filesystem helpers shared by the manifest, settings and override writers.

use super::errors::{EngineError, EngineResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Milliseconds since the Unix epoch, as used in restore-point ids.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Reads and parses a JSON document.
///
/// Returns `Ok(None)` when the file does not exist so callers can tell
/// "absent" apart from "present but broken".
pub fn read_json<T: DeserializeOwned>(path: &Path) -> EngineResult<Option<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(EngineError::io(path, e)),
    };

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|e| EngineError::json(path.display().to_string(), e))
}

/// Temp file used by [`write_json_atomic`] for the given target.
pub fn temp_path_for(path: &Path, stamp: i64) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "state.json".to_string());
    path.with_file_name(format!("{file_name}.tmp-{stamp}"))
}

/// Serializes `value` into a temp file next to `path` and renames it over
/// `path`. Readers only ever observe the old or the new document.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> EngineResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| EngineError::io(parent, e))?;
    }

    let payload = serde_json::to_string_pretty(value)
        .map_err(|e| EngineError::json(path.display().to_string(), e))?;

    let temp_path = temp_path_for(path, now_millis());
    if let Err(e) = fs::write(&temp_path, payload) {
        let _ = fs::remove_file(&temp_path);
        return Err(EngineError::io(&temp_path, e));
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(EngineError::io(path, e));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_json_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let value: Option<serde_json::Value> = read_json(&dir.path().join("nope.json")).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_read_json_malformed_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        let result: EngineResult<Option<serde_json::Value>> = read_json(&path);
        assert!(matches!(result, Err(EngineError::Json { .. })));
    }

    #[test]
    fn test_write_json_atomic_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        write_json_atomic(&path, &json!({"version": 1})).unwrap();
        write_json_atomic(&path, &json!({"version": 2})).unwrap();

        let value: serde_json::Value = read_json(&path).unwrap().unwrap();
        assert_eq!(value["version"], 2);

        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let temp = temp_path_for(Path::new("/prefs/restore_points.json"), 42);
        assert_eq!(temp, PathBuf::from("/prefs/restore_points.json.tmp-42"));
    }
}
