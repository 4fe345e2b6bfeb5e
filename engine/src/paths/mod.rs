//! Per-theme path resolution.

pub mod theme_path;
pub mod validation;

pub use theme_path::{ThemePathResolver, ThemePaths};
pub use validation::{ThemeNameValidator, Validator};
