//! Attaching context to typed errors.
//!
//! [`ResultExt`] wraps an [`Error`] in [`Error::WithContext`] without
//! losing its variant: `code()`, `is_recoverable()` and `root()` all look
//! through the wrapper. The registry uses it to name the resource URI on
//! handler failures, so a reply reads "Failed to read resource
//! 'db://users/1': ..." while keeping the handler's error code.

use super::types::Error;

/// Extension trait for adding context to `Result` types.
///
/// # Example
///
/// ```rust
/// use resourcekit_core::error::{Error, ResultExt, codes};
///
/// fn read_user(uri: &str) -> Result<String, Error> {
///     let fetched: Result<String, Error> = Err(Error::handler(uri, "database unavailable"));
///     fetched.with_context(|| format!("Failed to read resource '{uri}'"))
/// }
///
/// let err = read_user("db://users/1").unwrap_err();
/// assert!(err.to_string().contains("db://users/1"));
/// assert_eq!(err.code(), codes::HANDLER_ERROR);
/// assert!(matches!(err.root(), Error::Handler { .. }));
/// ```
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context<C: Into<String>>(self, context: C) -> Result<T, Error>;

    /// Add context lazily (only evaluated on error).
    fn with_context<C, F>(self, f: F) -> Result<T, Error>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T> ResultExt<T> for Result<T, Error> {
    fn context<C: Into<String>>(self, context: C) -> Self {
        self.map_err(|e| Error::WithContext {
            context: context.into(),
            source: Box::new(e),
        })
    }

    fn with_context<C, F>(self, f: F) -> Self
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::WithContext {
            context: f().into(),
            source: Box::new(e),
        })
    }
}
