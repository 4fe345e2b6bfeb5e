//! Theme library: listing, per-theme overrides and change monitoring.

pub mod cache;
pub mod local;
pub mod monitor;
pub mod overrides;
pub mod repository;
pub mod types;

pub use cache::ThemeCache;
pub use local::{ListOptions, ListProgress, LocalThemes};
pub use monitor::{ChangeCallback, ThemeMonitor};
pub use overrides::{OVERRIDES_VERSION, ThemeOverrides};
pub use repository::ThemeRepository;
pub use types::{Theme, ThemeSource};
