//! Backend abstraction.
//!
//! Every remote operation the client performs goes through [`LmsBackend`],
//! so the session gate, permission resolver, and progress views can be
//! exercised against an in-memory backend in tests. The production
//! implementation is [`crate::FrappeClient`].

use async_trait::async_trait;
use secrecy::SecretString;

use novel_lms_core::{Identity, RoleClass};

use crate::frappe::{EnrollmentDoc, FrappeError, RoleListsDoc, UserDoc};

/// Remote operations against the LMS document backend.
#[async_trait]
pub trait LmsBackend: Send + Sync {
    /// Authenticate and establish a session.
    async fn login(&self, identity: &Identity, secret: &SecretString) -> Result<(), FrappeError>;

    /// Tear down the current session.
    async fn logout(&self) -> Result<(), FrappeError>;

    /// Fetch a user document by identity.
    async fn fetch_user(&self, identity: &Identity) -> Result<UserDoc, FrappeError>;

    /// Identity the current session belongs to (`Guest` when anonymous).
    async fn fetch_logged_user(&self) -> Result<Identity, FrappeError>;

    /// Fetch the role membership lists.
    async fn fetch_role_lists(&self) -> Result<RoleListsDoc, FrappeError>;

    /// Authoritative role classification for a user.
    ///
    /// `Ok(None)` means the user has no recognized LMS role - a definite
    /// answer, distinct from any `Err`.
    async fn fetch_user_permissions(
        &self,
        identity: &Identity,
    ) -> Result<Option<RoleClass>, FrappeError>;

    /// Fetch all enrollment rows for a member.
    async fn fetch_enrollments(&self, member: &Identity)
    -> Result<Vec<EnrollmentDoc>, FrappeError>;
}
