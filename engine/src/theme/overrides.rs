//! Per-theme parameter overrides.
//!
//! The current document is `{version, params, updatedAt}` under the prefs
//! directory. Older installs kept a file inside the theme itself, either as
//! `{overrides: {...}}`, `{params: {...}}` or a flat object of strings; those
//! are still read and merged underneath the current file.

use crate::common::EngineResult;
use crate::common::fs_util::{read_json, write_json_atomic};
use crate::paths::ThemePathResolver;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

pub const OVERRIDES_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OverrideDocument {
    version: u32,
    params: Map<String, Value>,
    updated_at: String,
}

/// Extracts the parameter map from any supported document shape.
pub fn parse_override_document(document: &Value) -> Map<String, Value> {
    let Some(object) = document.as_object() else {
        return Map::new();
    };

    for key in ["params", "overrides"] {
        if let Some(Value::Object(params)) = object.get(key) {
            return params.clone();
        }
    }

    object
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "version" | "updatedAt"))
        .filter(|(_, value)| value.is_string())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn read_params(path: &Path) -> Map<String, Value> {
    match read_json::<Value>(path) {
        Ok(Some(document)) => parse_override_document(&document),
        Ok(None) => Map::new(),
        Err(e) => {
            log::warn!("Ignoring unreadable overrides: {e}");
            Map::new()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ThemeOverrides {
    paths: ThemePathResolver,
}

impl ThemeOverrides {
    pub fn new(paths: ThemePathResolver) -> Self {
        Self { paths }
    }

    /// Legacy values first, current file on top. Missing files read as empty.
    pub fn read_overrides(&self, theme: &str) -> EngineResult<Map<String, Value>> {
        let paths = self.paths.resolve(theme)?;
        let mut merged = read_params(&paths.legacy_overrides_file);
        merged.extend(read_params(&paths.overrides_file));
        Ok(merged)
    }

    /// Replaces the overrides of `theme`, always in the current shape.
    pub fn write_overrides(&self, theme: &str, params: &Map<String, Value>) -> EngineResult<()> {
        let paths = self.paths.resolve(theme)?;
        let document = OverrideDocument {
            version: OVERRIDES_VERSION,
            params: params.clone(),
            updated_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        };
        write_json_atomic(&paths.overrides_file, &document)?;
        log::debug!("Saved {} override(s) for theme '{theme}'", params.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::EngineLayout;
    use serde_json::json;
    use std::fs;

    fn overrides(root: &Path) -> (ThemeOverrides, ThemePathResolver) {
        let resolver = ThemePathResolver::new(EngineLayout::rooted_at(root));
        (ThemeOverrides::new(resolver.clone()), resolver)
    }

    #[test]
    fn test_parse_all_shapes() {
        let current = json!({"version": 1, "params": {"accent": "#fff", "gap": 4}, "updatedAt": "x"});
        assert_eq!(parse_override_document(&current)["gap"], 4);

        let legacy_overrides = json!({"overrides": {"accent": "red"}});
        assert_eq!(parse_override_document(&legacy_overrides)["accent"], "red");

        let flat = json!({"accent": "blue", "gap": 3, "version": "2"});
        let parsed = parse_override_document(&flat);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed["accent"], "blue");

        assert!(parse_override_document(&json!([1, 2])).is_empty());
    }

    #[test]
    fn test_current_file_wins_over_legacy() {
        let dir = tempfile::tempdir().unwrap();
        let (overrides, resolver) = overrides(dir.path());
        let paths = resolver.resolve("nord").unwrap();

        fs::create_dir_all(paths.legacy_overrides_file.parent().unwrap()).unwrap();
        fs::write(
            &paths.legacy_overrides_file,
            r#"{"accent": "red", "font": "mono"}"#,
        )
        .unwrap();

        let mut params = Map::new();
        params.insert("accent".to_string(), json!("blue"));
        overrides.write_overrides("nord", &params).unwrap();

        let merged = overrides.read_overrides("nord").unwrap();
        assert_eq!(merged["accent"], "blue");
        assert_eq!(merged["font"], "mono");

        let written: Value =
            serde_json::from_str(&fs::read_to_string(&paths.overrides_file).unwrap()).unwrap();
        assert_eq!(written["version"], OVERRIDES_VERSION);
        assert!(written["updatedAt"].is_string());
    }

    #[test]
    fn test_missing_and_broken_files_read_empty() {
        let dir = tempfile::tempdir().unwrap();
        let (overrides, resolver) = overrides(dir.path());
        assert!(overrides.read_overrides("nord").unwrap().is_empty());

        let paths = resolver.resolve("nord").unwrap();
        fs::create_dir_all(paths.overrides_file.parent().unwrap()).unwrap();
        fs::write(&paths.overrides_file, "not json").unwrap();
        assert!(overrides.read_overrides("nord").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_theme_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (overrides, _) = overrides(dir.path());
        assert!(overrides.read_overrides("../escape").is_err());
    }
}
