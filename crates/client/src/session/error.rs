//! Authentication error types.

use thiserror::Error;

use crate::frappe::FrappeError;
use crate::permissions::PermissionError;

/// Errors that can occur during login, logout, and session validation.
///
/// Every variant's `Display` text is safe to show to the user; the login
/// form is re-enabled after any of them. A user with no recognized role is
/// not an error - see [`crate::session::LoginOutcome::InsufficientPermissions`].
#[derive(Debug, Error)]
pub enum AuthError {
    /// Login rejected by the backend; no retry loop, the user corrects and
    /// resubmits.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Transient transport failure on any step of the flow.
    #[error("could not reach the learning platform: {0}")]
    Network(#[from] FrappeError),

    /// Role lookup failed after a successful login; the session was
    /// reverted rather than left half-authenticated.
    #[error("signed in, but your permissions could not be determined: {0}")]
    PermissionResolution(#[from] PermissionError),

    /// The backend reported the session invalid mid-use.
    #[error("your session is no longer valid, please sign in again")]
    SessionInvalidated,
}
