//! # LastLayer Engine
//!
//! Core library for the LastLayer theme manager. It owns the on-disk theme
//! library and the restore points taken of the live `default` theme.
//!
//! ## Modules
//!
//! - [`common`] - Error types shared by every facet
//! - [`layout`] - Base directories the engine works under
//! - [`paths`] - Deterministic per-theme path resolution
//! - [`theme`] - Theme listing, metadata, overrides, cache and monitoring
//! - [`restore_points`] - Restore-point manifest, snapshots and workflows
//! - [`ports`] - Collaborator interfaces (exec, settings, events, scripts)
//! - [`adapters`] - Concrete implementations of the collaborator ports
//! - [`state`] - Runtime state shared between facets

pub mod adapters;
pub mod common;
pub mod layout;
pub mod paths;
pub mod ports;
pub mod restore_points;
pub mod state;
pub mod theme;

pub use common::{EngineError, EngineResult};
pub use layout::EngineLayout;
pub use layout::EngineOptions;
pub use restore_points::RestorePointService;
pub use theme::ThemeRepository;
