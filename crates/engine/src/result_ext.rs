//! Result extension trait for logging errors with context.
//!
//! Used on best-effort writes, where a failure must be recorded but does not
//! change the caller's control flow.

use std::fmt::Display;
use tracing::error;

/// Extension trait for logging errors with context.
pub trait ResultExt<T, E> {
    /// Log the error with context and caller location if this is an `Err`.
    ///
    /// Returns the original `Result` unchanged.
    ///
    /// ```ignore
    /// use bizflow_engine::result_ext::ResultExt;
    ///
    /// let _ = store.update(&activity).await.log("persisting failed activity");
    /// ```
    fn log<S: ToString>(self, context: S) -> Result<T, E>;
}

impl<T, E: Display> ResultExt<T, E> for Result<T, E> {
    #[track_caller]
    fn log<S: ToString>(self, context: S) -> Result<T, E> {
        if let Err(ref e) = self {
            let caller_location = std::panic::Location::caller();
            error!(
                target: "bizflow_engine",
                error = %e,
                file = %format!("{}:{}", caller_location.file(), caller_location.line()),
                context = %context.to_string(),
                "Operation failed"
            );
        }
        self
    }
}
