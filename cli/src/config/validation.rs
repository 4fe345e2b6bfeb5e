use super::app::AppConfig;

/// Configuration validation errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("Invalid theme_cache_ttl_secs: {configured} (min: {min_limit}, max: {max_limit})")]
    ThemeCacheTtl {
        configured: u64,
        min_limit: u64,
        max_limit: u64,
    },
    #[error("Invalid monitor_debounce_ms: {configured} (min: {min_limit}, max: {max_limit})")]
    MonitorDebounce {
        configured: u64,
        min_limit: u64,
        max_limit: u64,
    },
    #[error("Invalid tree_node_limit: {configured} (min: {min_limit}, max: {max_limit})")]
    TreeNodeLimit {
        configured: usize,
        min_limit: usize,
        max_limit: usize,
    },
    #[error("Invalid list_batch_size: {configured} (min: {min_limit}, max: {max_limit})")]
    ListBatchSize {
        configured: usize,
        min_limit: usize,
        max_limit: usize,
    },
    #[error("Invalid logging.level: {configured}")]
    LogLevel { configured: String },
}

impl ConfigValidationError {
    pub fn user_message(&self) -> String {
        match self {
            ConfigValidationError::ThemeCacheTtl {
                configured,
                min_limit,
                max_limit,
            } => format!(
                "Theme cache TTL out of range!\n\nYour configured value: {configured} seconds\nValid range: {min_limit} - {max_limit} seconds\n\nPlease update theme_cache_ttl_secs in config.toml."
            ),
            ConfigValidationError::MonitorDebounce {
                configured,
                min_limit,
                max_limit,
            } => format!(
                "Theme monitor debounce out of range!\n\nYour configured value: {configured} ms\nValid range: {min_limit} - {max_limit} ms\n\nPlease update monitor_debounce_ms in config.toml."
            ),
            ConfigValidationError::TreeNodeLimit {
                configured,
                min_limit,
                max_limit,
            } => format!(
                "Restore point tree limit out of range!\n\nYour configured value: {configured}\nValid range: {min_limit} - {max_limit}\n\nPlease update tree_node_limit in config.toml."
            ),
            ConfigValidationError::ListBatchSize {
                configured,
                min_limit,
                max_limit,
            } => format!(
                "Theme listing batch size out of range!\n\nYour configured value: {configured}\nValid range: {min_limit} - {max_limit}\n\nPlease update list_batch_size in config.toml."
            ),
            ConfigValidationError::LogLevel { configured } => format!(
                "Unknown log level '{configured}'!\n\nUse one of: trace, debug, info, warn, error.\n\nPlease update [logging] level in config.toml."
            ),
        }
    }
}

/// Configuration loading result
#[derive(Debug)]
pub enum ConfigLoadResult {
    Success(Box<AppConfig>),
    LoadError(String),
    DeserializeError(String),
}
