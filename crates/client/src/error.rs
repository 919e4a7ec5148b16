//! Unified error handling.
//!
//! Each concern has its own error type (`FrappeError`, `AuthError`,
//! `PermissionError`, `ConfigError`); `ClientError` aggregates them for
//! callers that drive the whole client, like the CLI.

use thiserror::Error;

use crate::config::ConfigError;
use crate::frappe::FrappeError;
use crate::permissions::PermissionError;
use crate::session::AuthError;

/// Application-level error type for the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration loading failed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A backend call failed outside the auth flow.
    #[error("backend error: {0}")]
    Backend(#[from] FrappeError),

    /// Login, logout, or session validation failed.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Role resolution failed.
    #[error("permission error: {0}")]
    Permission(#[from] PermissionError),
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_nests_cause() {
        let err = ClientError::Backend(FrappeError::NotFound("User/x".to_string()));
        assert_eq!(err.to_string(), "backend error: not found: User/x");
    }
}
