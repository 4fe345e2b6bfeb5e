use super::{LoggingConfig, limits::*, validation::ConfigValidationError};
use engine::{EngineLayout, EngineOptions};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main application configuration
#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    themes_dir: Option<PathBuf>,
    prefs_dir: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    temp_dir: Option<PathBuf>,

    theme_cache_ttl_secs: Option<u64>,
    monitor_debounce_ms: Option<u64>,
    tree_node_limit: Option<usize>,
    list_batch_size: Option<usize>,

    #[serde(default)]
    logging: LoggingConfig,
}

impl AppConfig {
    /// Validate the configuration against defined limits
    pub fn validate(&self) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        let ttl = self.theme_cache_ttl_secs();
        if !(MIN_THEME_CACHE_TTL_SECS..=MAX_THEME_CACHE_TTL_SECS).contains(&ttl) {
            errors.push(ConfigValidationError::ThemeCacheTtl {
                configured: ttl,
                min_limit: MIN_THEME_CACHE_TTL_SECS,
                max_limit: MAX_THEME_CACHE_TTL_SECS,
            });
        }

        let debounce = self.monitor_debounce_ms();
        if !(MIN_MONITOR_DEBOUNCE_MS..=MAX_MONITOR_DEBOUNCE_MS).contains(&debounce) {
            errors.push(ConfigValidationError::MonitorDebounce {
                configured: debounce,
                min_limit: MIN_MONITOR_DEBOUNCE_MS,
                max_limit: MAX_MONITOR_DEBOUNCE_MS,
            });
        }

        let nodes = self.tree_node_limit();
        if !(MIN_TREE_NODE_LIMIT..=MAX_TREE_NODE_LIMIT).contains(&nodes) {
            errors.push(ConfigValidationError::TreeNodeLimit {
                configured: nodes,
                min_limit: MIN_TREE_NODE_LIMIT,
                max_limit: MAX_TREE_NODE_LIMIT,
            });
        }

        let batch = self.list_batch_size();
        if !(MIN_LIST_BATCH_SIZE..=MAX_LIST_BATCH_SIZE).contains(&batch) {
            errors.push(ConfigValidationError::ListBatchSize {
                configured: batch,
                min_limit: MIN_LIST_BATCH_SIZE,
                max_limit: MAX_LIST_BATCH_SIZE,
            });
        }

        let level = self.logging.level().to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            errors.push(ConfigValidationError::LogLevel { configured: level });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn themes_dir(&self) -> PathBuf {
        self.themes_dir
            .clone()
            .unwrap_or_else(|| EngineLayout::from_user_dirs().themes_root)
    }

    pub fn prefs_dir(&self) -> PathBuf {
        self.prefs_dir
            .clone()
            .unwrap_or_else(|| EngineLayout::from_user_dirs().prefs_dir)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| EngineLayout::from_user_dirs().cache_dir)
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn theme_cache_ttl_secs(&self) -> u64 {
        self.theme_cache_ttl_secs.unwrap_or(30)
    }

    pub fn monitor_debounce_ms(&self) -> u64 {
        self.monitor_debounce_ms.unwrap_or(300)
    }

    pub fn tree_node_limit(&self) -> usize {
        self.tree_node_limit.unwrap_or(20_000)
    }

    pub fn list_batch_size(&self) -> usize {
        self.list_batch_size.unwrap_or(8)
    }

    pub fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    /// Directories handed to the engine.
    pub fn layout(&self) -> EngineLayout {
        EngineLayout::new(
            self.themes_dir(),
            self.prefs_dir(),
            self.cache_dir(),
            self.temp_dir(),
        )
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            theme_cache_ttl: Duration::from_secs(self.theme_cache_ttl_secs()),
            monitor_debounce: Duration::from_millis(self.monitor_debounce_ms()),
            tree_node_limit: self.tree_node_limit(),
            list_batch_size: self.list_batch_size(),
        }
    }
}
