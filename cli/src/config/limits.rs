//! Bounds the configured tunables are validated against.

/// Shortest theme cache lifetime accepted.
pub const MIN_THEME_CACHE_TTL_SECS: u64 = 1;

/// Longest theme cache lifetime accepted (1 hour)
pub const MAX_THEME_CACHE_TTL_SECS: u64 = 3600;

/// Monitor debounce window bounds
pub const MIN_MONITOR_DEBOUNCE_MS: u64 = 10;
pub const MAX_MONITOR_DEBOUNCE_MS: u64 = 10_000;

/// Tree walk node budget bounds
pub const MIN_TREE_NODE_LIMIT: usize = 10;
pub const MAX_TREE_NODE_LIMIT: usize = 1_000_000;

/// Async theme listing batch bounds
pub const MIN_LIST_BATCH_SIZE: usize = 1;
pub const MAX_LIST_BATCH_SIZE: usize = 256;
