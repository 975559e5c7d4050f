/// Error taxonomy shared by every core operation
///
/// All variants are recoverable: callers render them as user feedback
/// (the API maps them onto HTTP status codes). Nothing in the core panics
/// on a bad request.
///
/// # Example
///
/// ```
/// use tasktracker_shared::error::{CoreError, CoreResult};
///
/// fn require_title(title: &str) -> CoreResult<()> {
///     if title.trim().is_empty() {
///         return Err(CoreError::Validation("Title is required".to_string()));
///     }
///     Ok(())
/// }
///
/// assert!(require_title("  ").is_err());
/// ```

/// Result alias used throughout the core
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors returned by the account, task and report services
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Registration with an email that already exists
    #[error("Email already registered")]
    DuplicateEmail,

    /// Password rejected by the configured password policy
    #[error("Password too weak: {0}")]
    WeakPassword(String),

    /// Unknown email, wrong password, or dead session token
    ///
    /// Deliberately carries no detail so callers cannot tell the cases apart.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Malformed input (empty title, bad status value, inverted window, ...)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Resource missing or owned by another user
    #[error("Resource not found")]
    NotFound,

    /// Persistent store could not be reached; the caller may retry
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl CoreError {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::StoreUnavailable(_))
    }
}

/// Maps database failures onto the core taxonomy
///
/// - unique violations on the users table become `DuplicateEmail`
/// - foreign key violations (task for a missing user) become `NotFound`
/// - everything else is reported as `StoreUnavailable`
impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => CoreError::NotFound,
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    if let Some(constraint) = db_err.constraint() {
                        if constraint.contains("email") {
                            return CoreError::DuplicateEmail;
                        }
                    }
                }
                if db_err.is_foreign_key_violation() {
                    return CoreError::NotFound;
                }
                CoreError::StoreUnavailable(format!("Database error: {}", db_err))
            }
            other => CoreError::StoreUnavailable(format!("Database error: {}", other)),
        }
    }
}
