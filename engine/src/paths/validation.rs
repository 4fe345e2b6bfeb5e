use crate::common::EngineError;

/// Core validation trait that all validators implement.
///
/// # Type Parameters
///
/// * `T` - The type of data being validated (can be unsized like `str`)
pub trait Validator<T: ?Sized> {
    type Error;

    /// Validate the input and return Ok(()) if valid, or Err with validation error
    fn validate(&self, input: &T) -> Result<(), Self::Error>;
}

const MAX_THEME_NAME_LEN: usize = 128;

/// Validator for theme names.
///
/// Theme names become directory and file names, so anything that could walk
/// out of the themes root is rejected. Spaces, dots and unicode are allowed
/// because existing theme folders use them.
pub struct ThemeNameValidator;

impl Validator<str> for ThemeNameValidator {
    type Error = EngineError;

    fn validate(&self, input: &str) -> Result<(), Self::Error> {
        let reject = |reason: &str| EngineError::InvalidThemeName {
            name: input.to_string(),
            reason: reason.to_string(),
        };

        if input.trim().is_empty() {
            return Err(reject("Name cannot be empty"));
        }

        if input.len() > MAX_THEME_NAME_LEN {
            return Err(reject("Name too long (max 128 bytes)"));
        }

        if input == "." || input == ".." {
            return Err(reject("Name cannot be a relative path component"));
        }

        if input.contains(['/', '\\', '\0']) {
            return Err(reject("Name contains path separators or NUL"));
        }

        Ok(())
    }
}
