use thiserror::Error;

/// Failure taxonomy for the session core.
///
/// Construction failures (`Configuration`, `Resource`) abort session creation
/// entirely; `Runtime` aborts only the current call and leaves the session
/// usable. `AbsentSession` is what registry lookups report for a freed or
/// unknown handle — the registry's total wrappers convert it into a defined
/// default instead of letting it escape.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("failed to acquire model resources: {0}")]
    Resource(String),

    #[error("model runtime failure: {0}")]
    Runtime(String),

    #[error("no live session for this handle")]
    AbsentSession,
}

pub type Result<T> = std::result::Result<T, SessionError>;
