use crate::paths::ThemePaths;
use crate::restore_points::state_paths::is_path_in_directory;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Where a theme record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeSource {
    #[default]
    Local,
    Network,
}

/// One entry of the theme list.
///
/// Records are rebuilt on every cache refresh and never mutated afterwards;
/// the cache hands out clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub name: String,
    pub title: String,
    pub icon: Option<PathBuf>,
    pub source: ThemeSource,
    pub path: PathBuf,
    /// Parsed metadata document, `{}` when there was none.
    pub metadata: Value,
    pub download_count: u64,
    pub average_install_ms: Option<u64>,
    pub average_apply_ms: Option<u64>,
    pub install_count: u64,
    pub apply_count: u64,

    // Filled for themes that originate from the online catalogue.
    pub is_network: bool,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub published: Option<String>,
    pub repository_url: Option<String>,
}

fn string_field(metadata: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| metadata.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn count_field(metadata: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter()
        .filter_map(|key| metadata.get(*key))
        .find_map(|value| match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
}

fn tags_field(metadata: &Map<String, Value>) -> Vec<String> {
    match metadata.get("tags") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(list)) => list
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

impl Theme {
    /// Record used when a theme has no readable metadata.
    pub fn bare(name: &str, path: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            title: name.to_string(),
            icon: None,
            source: ThemeSource::Local,
            path,
            metadata: Value::Object(Map::new()),
            download_count: 0,
            average_install_ms: None,
            average_apply_ms: None,
            install_count: 0,
            apply_count: 0,
            is_network: false,
            author: None,
            tags: Vec::new(),
            published: None,
            repository_url: None,
        }
    }

    /// Merges a metadata document onto the bare record for `paths`.
    pub fn from_metadata(paths: &ThemePaths, metadata: Map<String, Value>) -> Self {
        let mut theme = Self::bare(&paths.name, paths.theme_dir.clone());

        if let Some(title) = string_field(&metadata, &["title", "displayName", "name"]) {
            theme.title = title;
        }
        theme.author = string_field(&metadata, &["author"]);
        theme.tags = tags_field(&metadata);
        theme.published = string_field(&metadata, &["published", "publishedAt"]);
        theme.repository_url = string_field(&metadata, &["repositoryUrl", "repository"]);
        theme.download_count = count_field(&metadata, &["downloadCount", "downloads"]).unwrap_or(0);
        theme.install_count = count_field(&metadata, &["installCount"]).unwrap_or(0);
        theme.apply_count = count_field(&metadata, &["applyCount"]).unwrap_or(0);
        theme.average_install_ms = count_field(&metadata, &["averageInstallMs"]);
        theme.average_apply_ms = count_field(&metadata, &["averageApplyMs"]);
        theme.icon = string_field(&metadata, &["icon"])
            .map(|icon| paths.theme_dir.join(icon))
            .filter(|icon| icon.is_file() && is_path_in_directory(icon, &paths.theme_dir));
        theme.metadata = Value::Object(metadata);
        theme
    }

    /// Fills `icon` from the preview or the cached icon when metadata gave none.
    pub fn with_fallback_icon(mut self, paths: &ThemePaths) -> Self {
        if self.icon.is_none() {
            self.icon = [&paths.preview_file, &paths.cache_icon]
                .into_iter()
                .find(|candidate| candidate.is_file())
                .cloned();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::EngineLayout;
    use crate::paths::ThemePathResolver;
    use serde_json::json;

    fn paths(root: &std::path::Path, name: &str) -> ThemePaths {
        ThemePathResolver::new(EngineLayout::rooted_at(root))
            .resolve(name)
            .unwrap()
    }

    #[test]
    fn test_metadata_fields_are_merged() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path(), "nord");
        let metadata = json!({
            "title": "Nord Dark",
            "author": "arctic",
            "tags": "dark, blue,",
            "downloadCount": 42,
            "averageApplyMs": 120.4,
            "custom": true
        });

        let theme = Theme::from_metadata(&paths, metadata.as_object().unwrap().clone());
        assert_eq!(theme.title, "Nord Dark");
        assert_eq!(theme.author.as_deref(), Some("arctic"));
        assert_eq!(theme.tags, vec!["dark", "blue"]);
        assert_eq!(theme.download_count, 42);
        assert_eq!(theme.average_apply_ms, Some(120));
        assert_eq!(theme.metadata["custom"], true);
        assert_eq!(theme.source, ThemeSource::Local);
    }

    #[test]
    fn test_icon_outside_theme_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path(), "nord");
        std::fs::create_dir_all(&paths.theme_dir).unwrap();
        std::fs::write(dir.path().join("secret.png"), b"x").unwrap();

        let metadata = json!({ "icon": "../../secret.png" });
        let theme = Theme::from_metadata(&paths, metadata.as_object().unwrap().clone());
        assert!(theme.icon.is_none());
    }
}
