//! Integration tests for the Novel LMS client.
//!
//! The client reaches its backend only through the `LmsBackend` trait, so
//! these tests run the real session gate, permission resolver, and progress
//! views against [`FakeBackend`] - an in-memory backend with scripted
//! fixtures, failure injection, and call counters.
//!
//! # Test Categories
//!
//! - `login_flow` - Session gate state machine and redirect selection
//! - `permission_cache` - Role cache TTL and request coalescing
//! - `progress_views` - Enrollment fetch and progress normalization

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use novel_lms_client::frappe::{EnrollmentDoc, FrappeError, MemberRow, RoleListsDoc, UserDoc};
use novel_lms_client::{LmsBackend, LmsConfig};
use novel_lms_core::{Identity, ModuleStatus, RoleClass};

/// Parse an identity, panicking on bad test input.
///
/// # Panics
///
/// Panics when the string is not a valid identity.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn identity(s: &str) -> Identity {
    Identity::parse(s).unwrap()
}

/// Wrap a password for the login API.
#[must_use]
pub fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_string())
}

/// Client configuration pointing at a placeholder URL; the fake backend
/// never dials it.
///
/// # Panics
///
/// Never; the URL literal is valid.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn test_config() -> LmsConfig {
    LmsConfig::new(Url::parse("https://lms.test").unwrap())
}

/// Build an enrollment row fixture.
#[must_use]
pub fn enrollment(
    module: &str,
    status: Option<ModuleStatus>,
    progress: Option<f64>,
    overall_progress: Option<f64>,
) -> EnrollmentDoc {
    EnrollmentDoc {
        name: format!("ENRL-{module}"),
        module: module.to_string(),
        status,
        progress,
        overall_progress,
    }
}

/// In-memory `LmsBackend` with scripted fixtures and call counters.
///
/// Fixtures are set up with the builder methods; counters and the session
/// marker are inspected after driving the client.
#[derive(Default)]
pub struct FakeBackend {
    users: Mutex<HashMap<Identity, UserDoc>>,
    passwords: Mutex<HashMap<Identity, String>>,
    role_lists: Mutex<RoleListsDoc>,
    rpc_roles: Mutex<HashMap<Identity, RoleClass>>,
    rpc_unavailable: AtomicBool,
    permissions_failing: AtomicBool,
    enrollments: Mutex<HashMap<Identity, Vec<EnrollmentDoc>>>,
    login_delay: Mutex<Option<Duration>>,
    permission_delay: Mutex<Option<Duration>>,
    session: Mutex<Option<Identity>>,
    login_count: AtomicUsize,
    logout_count: AtomicUsize,
    user_fetch_count: AtomicUsize,
    probe_count: AtomicUsize,
    permission_count: AtomicUsize,
    role_list_count: AtomicUsize,
}

impl FakeBackend {
    /// Create an empty backend: no users, no roles, RPC available.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Fixtures
    // =========================================================================

    /// Register a user with a password.
    #[must_use]
    pub fn with_user(self, id: &str, full_name: &str, password: &str) -> Self {
        let user = identity(id);
        lock(&self.users).insert(
            user.clone(),
            UserDoc {
                name: user.clone(),
                full_name: Some(full_name.to_string()),
                user_image: None,
            },
        );
        lock(&self.passwords).insert(user, password.to_string());
        self
    }

    /// Script the permission RPC's answer for a user.
    ///
    /// Users without a scripted answer get "no role assigned".
    #[must_use]
    pub fn with_rpc_role(self, id: &str, role: RoleClass) -> Self {
        lock(&self.rpc_roles).insert(identity(id), role);
        self
    }

    /// Add a user to one of the membership lists.
    #[must_use]
    pub fn with_list_role(self, id: &str, role: RoleClass) -> Self {
        {
            let mut lists = lock(&self.role_lists);
            let row = MemberRow { user: identity(id) };
            match role {
                RoleClass::Admin => lists.lms_admin.push(row),
                RoleClass::ContentEditor => lists.lms_content_editor.push(row),
                RoleClass::Student => lists.lms_student.push(row),
                RoleClass::TeamLead => lists.lms_team_lead.push(row),
            }
        }
        self
    }

    /// Make the permission RPC answer 404, as a backend without the LMS
    /// app's API does.
    #[must_use]
    pub fn without_permissions_rpc(self) -> Self {
        self.rpc_unavailable.store(true, Ordering::SeqCst);
        self
    }

    /// Add an enrollment row for a member.
    #[must_use]
    pub fn with_enrollment(self, member: &str, doc: EnrollmentDoc) -> Self {
        lock(&self.enrollments)
            .entry(identity(member))
            .or_default()
            .push(doc);
        self
    }

    /// Stall every login call, so tests can overlap submits.
    #[must_use]
    pub fn with_login_delay(self, delay: Duration) -> Self {
        *lock(&self.login_delay) = Some(delay);
        self
    }

    /// Stall every permission lookup, so tests can overlap resolutions.
    #[must_use]
    pub fn with_permission_delay(self, delay: Duration) -> Self {
        *lock(&self.permission_delay) = Some(delay);
        self
    }

    /// Toggle permission-lookup failure at runtime.
    pub fn set_permissions_failing(&self, failing: bool) {
        self.permissions_failing.store(failing, Ordering::SeqCst);
    }

    /// Kill the backend session out from under the client.
    pub fn drop_session(&self) {
        *lock(&self.session) = None;
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Identity the backend currently holds a session for.
    #[must_use]
    pub fn logged_session(&self) -> Option<Identity> {
        lock(&self.session).clone()
    }

    /// Number of login calls received.
    #[must_use]
    pub fn login_calls(&self) -> usize {
        self.login_count.load(Ordering::SeqCst)
    }

    /// Number of logout calls received.
    #[must_use]
    pub fn logout_calls(&self) -> usize {
        self.logout_count.load(Ordering::SeqCst)
    }

    /// Number of permission RPC calls received.
    #[must_use]
    pub fn permission_calls(&self) -> usize {
        self.permission_count.load(Ordering::SeqCst)
    }

    /// Number of membership-list fetches received.
    #[must_use]
    pub fn role_list_calls(&self) -> usize {
        self.role_list_count.load(Ordering::SeqCst)
    }

    /// Number of logged-user probes received.
    #[must_use]
    pub fn probe_calls(&self) -> usize {
        self.probe_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LmsBackend for FakeBackend {
    async fn login(&self, id: &Identity, password: &SecretString) -> Result<(), FrappeError> {
        self.login_count.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.login_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let expected = lock(&self.passwords).get(id).cloned();
        if expected.as_deref() == Some(password.expose_secret()) {
            *lock(&self.session) = Some(id.clone());
            Ok(())
        } else {
            Err(FrappeError::AuthenticationFailed(
                "Invalid login credentials".to_string(),
            ))
        }
    }

    async fn logout(&self) -> Result<(), FrappeError> {
        self.logout_count.fetch_add(1, Ordering::SeqCst);
        *lock(&self.session) = None;
        Ok(())
    }

    async fn fetch_user(&self, id: &Identity) -> Result<UserDoc, FrappeError> {
        self.user_fetch_count.fetch_add(1, Ordering::SeqCst);
        lock(&self.users)
            .get(id)
            .cloned()
            .ok_or_else(|| FrappeError::NotFound(format!("User/{id}")))
    }

    async fn fetch_logged_user(&self) -> Result<Identity, FrappeError> {
        self.probe_count.fetch_add(1, Ordering::SeqCst);
        // A missing session answers 403, which the HTTP client maps to
        // SessionExpired; "error fetching the logged in user" in the UI.
        lock(&self.session)
            .clone()
            .ok_or(FrappeError::SessionExpired)
    }

    async fn fetch_role_lists(&self) -> Result<RoleListsDoc, FrappeError> {
        self.role_list_count.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.role_lists).clone())
    }

    async fn fetch_user_permissions(
        &self,
        id: &Identity,
    ) -> Result<Option<RoleClass>, FrappeError> {
        self.permission_count.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.permission_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.permissions_failing.load(Ordering::SeqCst) {
            return Err(FrappeError::Server {
                status: 500,
                message: "internal server error".to_string(),
            });
        }
        if self.rpc_unavailable.load(Ordering::SeqCst) {
            return Err(FrappeError::MethodNotFound(
                "novel_lms.api.user_permissions.get_user_lms_permissions".to_string(),
            ));
        }
        Ok(lock(&self.rpc_roles).get(id).copied())
    }

    async fn fetch_enrollments(&self, member: &Identity) -> Result<Vec<EnrollmentDoc>, FrappeError> {
        Ok(lock(&self.enrollments)
            .get(member)
            .cloned()
            .unwrap_or_default())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
