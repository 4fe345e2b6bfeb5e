use std::path::PathBuf;
use thiserror::Error;

/// Errors raised inside the engine.
///
/// Public workflows (snapshot, restore, delete, scoped file access) turn these
/// into `None`/`false` sentinels after logging them. Lower level helpers
/// propagate them with `?` so the caller decides how much to degrade.
///
/// # Error Categories
///
/// ## Filesystem
/// - [`Io`] - An I/O call failed for a specific path
/// - [`NotFound`] - A required directory or file does not exist
///
/// ## Persisted state
/// - [`Json`] - A manifest, settings or metadata document could not be (de)serialized
///
/// ## Trust boundary
/// - [`UntrustedId`] - A restore-point id does not have the trusted shape
/// - [`InvalidRelativePath`] - A relative path contains `.`/`..` segments or is empty
/// - [`PathOutsideRoot`] - A resolved path escapes the directory it must stay in
/// - [`InvalidThemeName`] - A theme name cannot be turned into a directory name
///
/// ## Collaborators
/// - [`Exec`] - The subprocess port reported a failure
/// - [`Watch`] - The directory watcher could not be started
///
/// [`Io`]: EngineError::Io
/// [`NotFound`]: EngineError::NotFound
/// [`Json`]: EngineError::Json
/// [`UntrustedId`]: EngineError::UntrustedId
/// [`InvalidRelativePath`]: EngineError::InvalidRelativePath
/// [`PathOutsideRoot`]: EngineError::PathOutsideRoot
/// [`InvalidThemeName`]: EngineError::InvalidThemeName
/// [`Exec`]: EngineError::Exec
/// [`Watch`]: EngineError::Watch
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not found: {0}")]
    NotFound(PathBuf),

    #[error("JSON error in {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Untrusted restore point id: '{0}'")]
    UntrustedId(String),

    #[error("Invalid relative path: '{0}'")]
    InvalidRelativePath(String),

    #[error("Path {path} is outside of {root}")]
    PathOutsideRoot { path: PathBuf, root: PathBuf },

    #[error("Invalid theme name '{name}': {reason}")]
    InvalidThemeName { name: String, reason: String },

    #[error("Command {command} failed: {reason}")]
    Exec { command: String, reason: String },

    #[error("Directory watch failed: {0}")]
    Watch(String),
}

impl EngineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        EngineError::Json {
            context: context.into(),
            source,
        }
    }

    /// True when the error only says that something is absent.
    pub fn is_not_found(&self) -> bool {
        match self {
            EngineError::NotFound(_) => true,
            EngineError::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_not_found_is_classified() {
        let err = EngineError::io(
            "/missing",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_not_found());
        assert!(err.to_string().contains("/missing"));
    }

    #[test]
    fn test_permission_error_is_not_not_found() {
        let err = EngineError::io(
            "/locked",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_untrusted_id_message() {
        let err = EngineError::UntrustedId("../etc".to_string());
        assert_eq!(err.to_string(), "Untrusted restore point id: '../etc'");
    }
}
