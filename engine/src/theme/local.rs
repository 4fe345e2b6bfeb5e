//! Enumerates theme directories and parses their metadata.

use super::types::Theme;
use crate::common::fs_util::read_json;
use crate::common::{EngineError, EngineResult};
use crate::layout::DEFAULT_THEME_NAME;
use crate::paths::{ThemeNameValidator, ThemePathResolver, ThemePaths, Validator};
use serde_json::Value;
use std::fs;
use std::sync::Arc;

/// `(completed, total)` reported after each batch of the async listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListProgress {
    pub completed: usize,
    pub total: usize,
}

pub type ProgressCallback = Arc<dyn Fn(ListProgress) + Send + Sync>;

/// Knobs for [`LocalThemes::list_themes_async`].
#[derive(Clone)]
pub struct ListOptions {
    pub batch_size: usize,
    pub yield_between_batches: bool,
    pub progress: Option<ProgressCallback>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            batch_size: 8,
            yield_between_batches: true,
            progress: None,
        }
    }
}

impl std::fmt::Debug for ListOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListOptions")
            .field("batch_size", &self.batch_size)
            .field("yield_between_batches", &self.yield_between_batches)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// `default` first, everything else by name.
fn sort_theme_names(names: &mut [String]) {
    names.sort_by(|a, b| {
        (a != DEFAULT_THEME_NAME)
            .cmp(&(b != DEFAULT_THEME_NAME))
            .then_with(|| a.cmp(b))
    });
}

#[derive(Debug, Clone)]
pub struct LocalThemes {
    paths: ThemePathResolver,
}

impl LocalThemes {
    pub fn new(paths: ThemePathResolver) -> Self {
        Self { paths }
    }

    /// Names of the theme directories, symlinked ones included.
    pub fn theme_names(&self) -> EngineResult<Vec<String>> {
        let root = &self.paths.layout().themes_root;
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(EngineError::io(root, e)),
        };

        let mut names: Vec<String> = entries
            .flatten()
            .filter(|entry| {
                entry
                    .file_type()
                    .is_ok_and(|t| t.is_dir() || t.is_symlink())
            })
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| ThemeNameValidator.validate(name).is_ok())
            .collect();
        sort_theme_names(&mut names);
        Ok(names)
    }

    fn read_metadata(paths: &ThemePaths) -> Option<serde_json::Map<String, Value>> {
        for file in [&paths.metadata_file, &paths.legacy_metadata_file] {
            match read_json::<Value>(file) {
                Ok(Some(Value::Object(map))) => return Some(map),
                Ok(Some(_)) => {
                    log::warn!("Ignoring non-object metadata in {}", file.display());
                }
                Ok(None) => {}
                Err(e) => log::warn!("Unreadable theme metadata: {e}"),
            }
        }
        None
    }

    /// Builds the record for one theme. Broken metadata yields a bare record.
    pub fn load_theme(&self, name: &str) -> EngineResult<Theme> {
        let paths = self.paths.resolve(name)?;
        let theme = match Self::read_metadata(&paths) {
            Some(metadata) => Theme::from_metadata(&paths, metadata),
            None => Theme::bare(name, paths.theme_dir.clone()),
        };
        Ok(theme.with_fallback_icon(&paths))
    }

    fn load_or_bare(&self, name: &str) -> Option<Theme> {
        match self.load_theme(name) {
            Ok(theme) => Some(theme),
            Err(e) => {
                log::warn!("Skipping theme '{name}': {e}");
                None
            }
        }
    }

    pub fn list_themes(&self) -> EngineResult<Vec<Theme>> {
        let names = self.theme_names()?;
        Ok(names.iter().filter_map(|name| self.load_or_bare(name)).collect())
    }

    /// Same result as [`Self::list_themes`], produced in batches with a
    /// yield to the runtime between them.
    pub async fn list_themes_async(&self, options: &ListOptions) -> EngineResult<Vec<Theme>> {
        let names = self.theme_names()?;
        let total = names.len();
        let batch_size = options.batch_size.max(1);
        let mut themes = Vec::with_capacity(total);
        let mut completed = 0;

        for batch in names.chunks(batch_size) {
            themes.extend(batch.iter().filter_map(|name| self.load_or_bare(name)));
            completed += batch.len();

            if let Some(progress) = &options.progress {
                progress(ListProgress { completed, total });
            }
            if options.yield_between_batches && completed < total {
                tokio::task::yield_now().await;
            }
        }

        Ok(themes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::EngineLayout;
    use std::path::Path;
    use std::sync::Mutex;

    fn local(root: &Path) -> LocalThemes {
        LocalThemes::new(ThemePathResolver::new(EngineLayout::rooted_at(root)))
    }

    fn make_theme(root: &Path, name: &str) -> std::path::PathBuf {
        let dir = root.join("themes").join(name);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_sort_puts_default_first() {
        let mut names = vec!["zen".to_string(), "default".to_string(), "aurora".to_string()];
        sort_theme_names(&mut names);
        assert_eq!(names, vec!["default", "aurora", "zen"]);
    }

    #[test]
    fn test_missing_root_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(local(dir.path()).list_themes().unwrap().is_empty());
    }

    #[test]
    fn test_metadata_precedence_and_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        let nord = make_theme(dir.path(), "nord");
        fs::write(nord.join("lastlayer.json"), r#"{"title":"Nord"}"#).unwrap();
        fs::write(nord.join("metadata.json"), r#"{"title":"Legacy"}"#).unwrap();

        let legacy = make_theme(dir.path(), "legacy");
        fs::write(legacy.join("metadata.json"), r#"{"title":"Old Style"}"#).unwrap();

        let broken = make_theme(dir.path(), "broken");
        fs::write(broken.join("lastlayer.json"), "{ nope").unwrap();

        make_theme(dir.path(), "default");
        fs::write(dir.path().join("themes").join("stray-file"), "x").unwrap();

        let themes = local(dir.path()).list_themes().unwrap();
        let titles: Vec<(&str, &str)> = themes
            .iter()
            .map(|t| (t.name.as_str(), t.title.as_str()))
            .collect();
        assert_eq!(
            titles,
            vec![
                ("default", "default"),
                ("broken", "broken"),
                ("legacy", "Old Style"),
                ("nord", "Nord"),
            ]
        );
    }

    #[test]
    fn test_unusable_lastlayer_metadata_falls_back_to_legacy_file() {
        let dir = tempfile::tempdir().unwrap();
        let nord = make_theme(dir.path(), "nord");
        fs::write(nord.join("lastlayer.json"), "{ broken").unwrap();
        fs::write(nord.join("metadata.json"), r#"{"title":"Nord Legacy"}"#).unwrap();

        let solar = make_theme(dir.path(), "solar");
        fs::write(solar.join("lastlayer.json"), "[1, 2]").unwrap();
        fs::write(solar.join("metadata.json"), r#"{"title":"Solar Legacy"}"#).unwrap();

        let local = local(dir.path());
        assert_eq!(local.load_theme("nord").unwrap().title, "Nord Legacy");
        assert_eq!(local.load_theme("solar").unwrap().title, "Solar Legacy");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_theme_is_listed() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("elsewhere");
        fs::create_dir_all(&target).unwrap();
        fs::create_dir_all(dir.path().join("themes")).unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("themes/linked")).unwrap();

        let names = local(dir.path()).theme_names().unwrap();
        assert_eq!(names, vec!["linked"]);
    }

    #[tokio::test]
    async fn test_async_listing_matches_sync_and_reports_progress() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            make_theme(dir.path(), &format!("theme-{i}"));
        }
        let local = local(dir.path());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let options = ListOptions {
            batch_size: 2,
            yield_between_batches: true,
            progress: Some(Arc::new(move |p: ListProgress| {
                sink.lock().unwrap().push((p.completed, p.total));
            })),
        };

        let async_themes = local.list_themes_async(&options).await.unwrap();
        assert_eq!(async_themes, local.list_themes().unwrap());
        assert_eq!(*seen.lock().unwrap(), vec![(2, 5), (4, 5), (5, 5)]);
    }
}
