use engine::EngineError;
use std::fmt::Display;

/// Errors surfaced by the command line front-end.
///
/// Engine workflows report most failures as `None`/`false`; this type covers
/// what the front-end itself decides is a failure (bad configuration, an id
/// that did not resolve, a workflow that returned nothing) plus engine errors
/// from the few calls that return `EngineResult`.
///
/// # Variants
///
/// - [`Config`] - configuration could not be loaded or failed validation
/// - [`Engine`] - an engine call returned an error
/// - [`NotFound`] - a theme, restore point or file did not exist
/// - [`Operation`] - a workflow completed without producing a result
/// - [`Logger`] - the log dispatcher could not be installed
///
/// [`Config`]: AppError::Config
/// [`Engine`]: AppError::Engine
/// [`NotFound`]: AppError::NotFound
/// [`Operation`]: AppError::Operation
/// [`Logger`]: AppError::Logger
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    Config(String),
    Engine(String),
    NotFound(String),
    Operation(String),
    Logger(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Configuration Error: {msg}"),
            AppError::Engine(msg) => write!(f, "Engine Error: {msg}"),
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::Operation(msg) => write!(f, "Operation Failed: {msg}"),
            AppError::Logger(msg) => write!(f, "Logger Error: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound(path) => AppError::NotFound(path.display().to_string()),
            other => AppError::Engine(other.to_string()),
        }
    }
}

impl From<log::SetLoggerError> for AppError {
    fn from(err: log::SetLoggerError) -> Self {
        AppError::Logger(err.to_string())
    }
}

/// Result type alias for front-end operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_engine_not_found_maps_to_not_found() {
        let err: AppError = EngineError::NotFound(PathBuf::from("/x")).into();
        assert_eq!(err, AppError::NotFound("/x".to_string()));
    }

    #[test]
    fn test_display_prefixes() {
        assert_eq!(
            AppError::Config("bad".to_string()).to_string(),
            "Configuration Error: bad"
        );
        let err: AppError = EngineError::UntrustedId("x".to_string()).into();
        assert!(err.to_string().starts_with("Engine Error:"));
    }
}
