//! Session gate: the authentication state machine.
//!
//! Owns the login/logout flow, the current-user identity, and the
//! role-derived landing-route decision. Exactly one [`SessionState`] holds
//! at any instant for the whole application.
//!
//! The login chain is strictly sequential - credential check, then identity
//! fetch, then role lookup, then destination - because each step depends on
//! the previous result. While the chain runs, the gate reports itself busy
//! and further submits are no-ops; the busy predicate is computed from the
//! state value itself, and the check-and-transition happens under one lock
//! acquisition so no second submit can slip in between.

mod error;

pub use error::AuthError;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use secrecy::SecretString;

use novel_lms_core::{Identity, RoleClass, RoleResolution, Route};

use crate::backend::LmsBackend;
use crate::frappe::{FrappeError, GUEST_USER};
use crate::permissions::PermissionResolver;

/// Notice shown when a signed-in user holds no recognized LMS role.
pub const INSUFFICIENT_PERMISSIONS_NOTICE: &str =
    "You do not have permission to access the learning platform. Contact your administrator.";

/// Minimal identity of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    /// Canonical identity, as the backend spells it.
    pub identity: Identity,
    /// Display name, when the user document carries one.
    pub full_name: Option<String>,
}

/// Authentication state of the whole application.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No session; the login form is interactive.
    Anonymous,
    /// Credentials submitted; waiting on the backend.
    Authenticating,
    /// Credentials accepted; resolving the role and destination.
    Redirecting {
        /// Canonical identity being resolved.
        identity: Identity,
    },
    /// Signed in with a resolved role.
    Authenticated {
        /// The signed-in user.
        user: CurrentUser,
        /// The role the landing route was derived from.
        role: RoleClass,
    },
    /// A step of the flow failed; the form is interactive again.
    Error {
        /// User-facing description of the failure.
        message: String,
    },
}

impl SessionState {
    /// Whether a login flow is in progress.
    ///
    /// While busy, the login form must not be rendered interactable and
    /// further submits are ignored.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Authenticating | Self::Redirecting { .. })
    }
}

/// Result of a login attempt that did not error.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// Signed in; navigate to `destination`.
    SignedIn {
        /// The signed-in user.
        user: CurrentUser,
        /// Resolved role.
        role: RoleClass,
        /// Landing route for the role.
        destination: Route,
    },
    /// Authenticated but no recognized role; the session was logged back
    /// out and the user returns to the login screen with a notice.
    InsufficientPermissions {
        /// User-facing permission-denied notice.
        notice: String,
        /// Always [`Route::Login`].
        destination: Route,
    },
    /// A login was already in flight; this submit was ignored and no
    /// network call was made.
    AlreadyPending,
}

/// The authentication state machine.
pub struct SessionGate {
    backend: Arc<dyn LmsBackend>,
    resolver: Arc<PermissionResolver>,
    state: Mutex<SessionState>,
}

impl SessionGate {
    /// Create a gate in the `Anonymous` state.
    #[must_use]
    pub fn new(backend: Arc<dyn LmsBackend>, resolver: Arc<PermissionResolver>) -> Self {
        Self {
            backend,
            resolver,
            state: Mutex::new(SessionState::Anonymous),
        }
    }

    /// Run the full login flow.
    ///
    /// On success the state is `Authenticated` and the outcome names the
    /// landing route. Authenticated-but-role-less users are logged back out
    /// and get [`LoginOutcome::InsufficientPermissions`]. A submit while a
    /// flow is already running returns [`LoginOutcome::AlreadyPending`]
    /// without touching the network.
    ///
    /// # Errors
    ///
    /// Any failure reverts to interactive-form semantics (state `Error`,
    /// not busy). [`AuthError::PermissionResolution`] additionally tears the
    /// fresh session down rather than leaving it half-authenticated.
    pub async fn login(
        &self,
        identity: &Identity,
        secret: &SecretString,
    ) -> Result<LoginOutcome, AuthError> {
        {
            // Busy check and the transition into Authenticating are one
            // critical section; a second submit observes the new state.
            let mut state = self.lock_state();
            if state.is_busy() {
                tracing::debug!("login already in flight, ignoring submit");
                return Ok(LoginOutcome::AlreadyPending);
            }
            *state = SessionState::Authenticating;
        }

        match self.run_login(identity, secret).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.set_state(SessionState::Error {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn run_login(
        &self,
        identity: &Identity,
        secret: &SecretString,
    ) -> Result<LoginOutcome, AuthError> {
        self.backend
            .login(identity, secret)
            .await
            .map_err(|err| match err {
                FrappeError::AuthenticationFailed(message) => {
                    AuthError::InvalidCredentials(message)
                }
                other => AuthError::Network(other),
            })?;

        // The backend may canonicalize the identity, so the rest of the
        // chain uses the document's name.
        let doc = self
            .backend
            .fetch_user(identity)
            .await
            .map_err(AuthError::Network)?;
        let user = CurrentUser {
            identity: doc.name,
            full_name: doc.full_name,
        };

        self.set_state(SessionState::Redirecting {
            identity: user.identity.clone(),
        });

        match self.resolver.resolve(&user.identity).await {
            Ok(RoleResolution::Resolved(role)) => {
                let destination = Route::landing_for(role);
                self.set_state(SessionState::Authenticated {
                    user: user.clone(),
                    role,
                });
                tracing::info!(
                    identity = %user.identity,
                    role = %role,
                    destination = %destination,
                    "login complete"
                );
                Ok(LoginOutcome::SignedIn {
                    user,
                    role,
                    destination,
                })
            }
            Ok(RoleResolution::NoRoleAssigned) => {
                tracing::info!(identity = %user.identity, "no recognized role, logging back out");
                self.abandon_session(&user.identity).await;
                self.set_state(SessionState::Anonymous);
                Ok(LoginOutcome::InsufficientPermissions {
                    notice: INSUFFICIENT_PERMISSIONS_NOTICE.to_string(),
                    destination: Route::Login,
                })
            }
            Err(err) => {
                self.abandon_session(&user.identity).await;
                Err(AuthError::PermissionResolution(err))
            }
        }
    }

    /// Sign out: remote logout, cached role dropped, state back to
    /// `Anonymous`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Network`] when the remote logout fails for any
    /// reason other than the session already being gone.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let identity = self.current_user().map(|user| user.identity);

        match self.backend.logout().await {
            // An already-dead session is as logged out as it gets.
            Ok(()) | Err(FrappeError::SessionExpired) => {}
            Err(err) => return Err(AuthError::Network(err)),
        }

        if let Some(identity) = identity {
            self.resolver.invalidate(&identity).await;
        }
        self.set_state(SessionState::Anonymous);
        tracing::info!("logged out");
        Ok(())
    }

    /// Ask the backend who the session cookie belongs to and reconcile
    /// local state with the answer.
    ///
    /// Immediately after logout the backend's session layer may still be
    /// tearing the cookie down and the probe fails; with no current user
    /// expected that failure is benign and swallowed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SessionInvalidated`] when the backend no longer
    /// recognizes the session the gate believed it had.
    pub async fn refresh_current_user(&self) -> Result<Option<CurrentUser>, AuthError> {
        let expected = self.current_user();
        let probe = self.backend.fetch_logged_user().await;

        match (expected, probe) {
            (None, Ok(identity)) if identity.as_str() != GUEST_USER => {
                // Live backend session without local state, e.g. a restored
                // cookie jar. Surface the identity without inventing a role.
                let doc = self
                    .backend
                    .fetch_user(&identity)
                    .await
                    .map_err(AuthError::Network)?;
                Ok(Some(CurrentUser {
                    identity: doc.name,
                    full_name: doc.full_name,
                }))
            }
            (None, Ok(_guest)) => Ok(None),
            (None, Err(err)) => {
                tracing::debug!(
                    error = %err,
                    "ignoring failed logged-user probe, no session expected"
                );
                Ok(None)
            }
            (Some(user), Ok(identity)) if user.identity == identity => Ok(Some(user)),
            (Some(_), Ok(_) | Err(FrappeError::SessionExpired)) => {
                self.invalidate_session().await;
                Err(AuthError::SessionInvalidated)
            }
            (Some(_), Err(err)) => Err(AuthError::Network(err)),
        }
    }

    /// React to a backend "session invalid" signal: drop the cached role
    /// and reset to `Anonymous` without a remote call.
    pub async fn invalidate_session(&self) {
        let identity = match &*self.lock_state() {
            SessionState::Authenticated { user, .. } => Some(user.identity.clone()),
            SessionState::Redirecting { identity } => Some(identity.clone()),
            _ => None,
        };
        if let Some(identity) = identity {
            self.resolver.invalidate(&identity).await;
        }
        self.set_state(SessionState::Anonymous);
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn current_state(&self) -> SessionState {
        self.lock_state().clone()
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<CurrentUser> {
        match &*self.lock_state() {
            SessionState::Authenticated { user, .. } => Some(user.clone()),
            _ => None,
        }
    }

    /// The signed-in user's role, if any.
    #[must_use]
    pub fn current_role(&self) -> Option<RoleClass> {
        match &*self.lock_state() {
            SessionState::Authenticated { role, .. } => Some(*role),
            _ => None,
        }
    }

    /// Whether a login flow is in progress.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.lock_state().is_busy()
    }

    /// Tear down a session the user never got to use.
    async fn abandon_session(&self, identity: &Identity) {
        if let Err(err) = self.backend.logout().await {
            tracing::debug!(error = %err, "best-effort logout failed while abandoning session");
        }
        self.resolver.invalidate(identity).await;
    }

    fn set_state(&self, next: SessionState) {
        *self.lock_state() = next;
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGate")
            .field("state", &self.current_state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn identity(s: &str) -> Identity {
        Identity::parse(s).unwrap()
    }

    #[test]
    fn test_busy_states() {
        assert!(!SessionState::Anonymous.is_busy());
        assert!(SessionState::Authenticating.is_busy());
        assert!(
            SessionState::Redirecting {
                identity: identity("a@example.com"),
            }
            .is_busy()
        );
        assert!(
            !SessionState::Authenticated {
                user: CurrentUser {
                    identity: identity("a@example.com"),
                    full_name: None,
                },
                role: RoleClass::Student,
            }
            .is_busy()
        );
        assert!(
            !SessionState::Error {
                message: "nope".to_string(),
            }
            .is_busy()
        );
    }

    #[test]
    fn test_insufficient_permissions_notice_mentions_permission() {
        assert!(INSUFFICIENT_PERMISSIONS_NOTICE.contains("permission"));
    }
}
