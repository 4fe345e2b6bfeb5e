use super::cache::ThemeCache;
use super::local::{ListOptions, LocalThemes};
use super::monitor::{ChangeCallback, ThemeMonitor};
use super::overrides::ThemeOverrides;
use super::types::Theme;
use crate::common::EngineResult;
use crate::layout::{EngineLayout, EngineOptions};
use crate::paths::ThemePathResolver;
use crate::ports::{EngineEvent, EventBus};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Theme listing, overrides and monitoring behind one cache.
pub struct ThemeRepository {
    paths: ThemePathResolver,
    cache: Arc<ThemeCache>,
    local: LocalThemes,
    overrides: ThemeOverrides,
    monitor: Mutex<Option<ThemeMonitor>>,
    debounce: Duration,
    batch_size: usize,
}

impl ThemeRepository {
    pub fn new(layout: EngineLayout, options: &EngineOptions) -> Self {
        let paths = ThemePathResolver::new(layout);
        Self {
            cache: Arc::new(ThemeCache::new(options.theme_cache_ttl)),
            local: LocalThemes::new(paths.clone()),
            overrides: ThemeOverrides::new(paths.clone()),
            monitor: Mutex::new(None),
            debounce: options.monitor_debounce,
            batch_size: options.list_batch_size,
            paths,
        }
    }

    pub fn paths(&self) -> &ThemePathResolver {
        &self.paths
    }

    pub fn cache(&self) -> &ThemeCache {
        &self.cache
    }

    /// Cached list, rebuilt from disk when the cache has expired.
    pub fn list_themes(&self) -> Vec<Theme> {
        if let Some(themes) = self.cache.get() {
            return themes;
        }

        match self.local.list_themes() {
            Ok(themes) => {
                self.cache.store(&themes);
                themes
            }
            Err(e) => {
                log::warn!("Failed to list themes: {e}");
                Vec::new()
            }
        }
    }

    /// Like [`Self::list_themes`] but yields between batches on a miss.
    /// A zero `batch_size` in `options` uses the configured default.
    pub async fn list_themes_async(&self, options: ListOptions) -> Vec<Theme> {
        if let Some(themes) = self.cache.get() {
            return themes;
        }

        let options = ListOptions {
            batch_size: if options.batch_size == 0 {
                self.batch_size
            } else {
                options.batch_size
            },
            ..options
        };

        match self.local.list_themes_async(&options).await {
            Ok(themes) => {
                self.cache.store(&themes);
                themes
            }
            Err(e) => {
                log::warn!("Failed to list themes: {e}");
                Vec::new()
            }
        }
    }

    pub fn get_theme(&self, name: &str) -> Option<Theme> {
        self.list_themes().into_iter().find(|theme| theme.name == name)
    }

    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    pub fn read_overrides(&self, theme: &str) -> EngineResult<Map<String, Value>> {
        self.overrides.read_overrides(theme)
    }

    pub fn write_overrides(&self, theme: &str, params: &Map<String, Value>) -> EngineResult<()> {
        self.overrides.write_overrides(theme, params)
    }

    /// Deletes a theme and drops the cached list.
    pub fn delete_theme(&self, name: &str) -> EngineResult<bool> {
        let deleted = self.paths.delete_theme(name)?;
        self.cache.invalidate();
        Ok(deleted)
    }

    /// Watches the themes root; each settled burst of changes emits
    /// [`EngineEvent::ThemesChanged`]. Needs a running tokio runtime.
    pub fn start_monitoring(&self, events: Arc<dyn EventBus>) -> EngineResult<()> {
        let Ok(mut slot) = self.monitor.lock() else {
            return Ok(());
        };
        if slot.as_ref().is_some_and(ThemeMonitor::is_running) {
            return Ok(());
        }

        let mut monitor = ThemeMonitor::new(self.debounce, Arc::clone(&self.cache));
        monitor.register_callback(Arc::new(move || events.emit(EngineEvent::ThemesChanged)));

        let root = &self.paths.layout().themes_root;
        if root.is_dir() {
            monitor.watch(root)?;
        } else {
            log::warn!("Themes root {} missing; changes only via notify_change", root.display());
        }

        *slot = Some(monitor);
        Ok(())
    }

    /// Adds a listener to the running monitor. Returns `false` when
    /// monitoring has not been started.
    pub fn register_change_callback(&self, callback: ChangeCallback) -> bool {
        match self.monitor.lock() {
            Ok(slot) => match slot.as_ref() {
                Some(monitor) => {
                    monitor.register_callback(callback);
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }

    /// Reports a change made by this process; without a monitor the cache
    /// is dropped immediately.
    pub fn notify_change(&self) {
        match self.monitor.lock().ok().as_deref().and_then(Option::as_ref) {
            Some(monitor) => monitor.notify_change(),
            None => self.cache.invalidate(),
        }
    }

    pub fn stop_monitoring(&self) {
        if let Ok(mut slot) = self.monitor.lock() {
            if let Some(mut monitor) = slot.take() {
                monitor.stop();
                log::info!("Theme monitoring stopped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FlumeEventBus;
    use std::fs;
    use std::path::Path;

    fn repository(root: &Path) -> ThemeRepository {
        ThemeRepository::new(EngineLayout::rooted_at(root), &EngineOptions::default())
    }

    #[test]
    fn test_list_is_served_from_cache_until_invalidated() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("themes/default")).unwrap();
        let repo = repository(dir.path());

        assert_eq!(repo.list_themes().len(), 1);
        fs::create_dir_all(dir.path().join("themes/nord")).unwrap();
        assert_eq!(repo.list_themes().len(), 1);

        repo.invalidate();
        assert_eq!(repo.list_themes().len(), 2);
        assert!(repo.get_theme("nord").is_some());
    }

    #[test]
    fn test_delete_theme_invalidates() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("themes/nord")).unwrap();
        let repo = repository(dir.path());
        assert_eq!(repo.list_themes().len(), 1);

        assert!(repo.delete_theme("nord").unwrap());
        assert!(repo.list_themes().is_empty());
        assert!(repo.delete_theme("default").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_notify_change_emits_themes_changed() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(dir.path());
        let (bus, events) = FlumeEventBus::new();
        repo.start_monitoring(Arc::new(bus)).unwrap();

        repo.notify_change();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(events.try_recv().ok(), Some(EngineEvent::ThemesChanged));
        repo.stop_monitoring();
    }

    #[tokio::test]
    async fn test_async_listing_fills_cache() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("themes/a")).unwrap();
        let repo = repository(dir.path());

        let themes = repo.list_themes_async(ListOptions::default()).await;
        assert_eq!(themes.len(), 1);
        assert!(repo.cache().get().is_some());
    }
}
