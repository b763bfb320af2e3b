//! Error types for the supportdesk domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all supportdesk operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Authentication / user directory errors ---
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    // --- Prompt assembly errors ---
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    // --- Generation backend errors ---
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    // --- Knowledge base errors ---
    #[error("Knowledge base error: {0}")]
    Kb(#[from] KbError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Email and credential are required")]
    InvalidInput,

    #[error("A user with this email already exists")]
    DuplicateUser,

    #[error("Invalid email or credential")]
    InvalidCredentials,

    #[error("User not found: {0}")]
    UserNotFound(uuid::Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("Prompt is too long: {tokens} tokens exceeds the {limit}-token context window")]
    TooLong { tokens: usize, limit: usize },
}

/// Failure taxonomy for the generation backend.
///
/// The backend adapter classifies its own failures into these variants;
/// nothing above the adapter boundary inspects error message text.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Out of memory / overload. Retryable by the caller after backoff.
    #[error("Generation backend is out of resources")]
    ResourceExhausted,

    /// Caller-side throttling. Retryable after a cooldown.
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Generic runtime failure inside the backend. Not retried automatically.
    #[error("Backend fault: {0}")]
    Fault(String),
}

#[derive(Debug, Error)]
pub enum KbError {
    #[error("Failed to read knowledge base at {path}: {reason}")]
    ReadError { path: String, reason: String },

    #[error("Failed to parse knowledge base: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_error_displays_counts() {
        let err = Error::Prompt(PromptError::TooLong {
            tokens: 3000,
            limit: 2048,
        });
        assert!(err.to_string().contains("3000"));
        assert!(err.to_string().contains("2048"));
    }

    #[test]
    fn auth_error_hides_failure_reason_detail() {
        // Both bad-email and bad-credential map to the same message.
        let err = AuthError::InvalidCredentials;
        assert_eq!(err.to_string(), "Invalid email or credential");
    }

    #[test]
    fn backend_error_rate_limited_display() {
        let err = Error::Backend(BackendError::RateLimited {
            retry_after_secs: 30,
        });
        assert!(err.to_string().contains("30"));
    }
}
