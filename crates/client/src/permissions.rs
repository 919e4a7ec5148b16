//! Role resolution with a process-wide, TTL-bounded cache.
//!
//! The resolver answers "what role does this identity hold" from a cache
//! when it can, and from the backend when it must. Concurrent lookups for
//! the same identity share one remote call. Failures are surfaced and never
//! cached; retries happen on the next explicit call, not on a timer.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use novel_lms_core::{Identity, RoleResolution};

use crate::backend::LmsBackend;
use crate::cache::CoalescingCache;
use crate::frappe::FrappeError;

/// How long a resolved role stays valid before it must be re-resolved.
pub const ROLE_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Upper bound on cached identities.
const ROLE_CACHE_CAPACITY: u64 = 1024;

/// A role lookup failed and the role is unresolved.
///
/// Distinct from [`RoleResolution::NoRoleAssigned`], which is a definite
/// backend answer: this error means "try again", not "no access".
#[derive(Debug, Clone, Error)]
#[error("role lookup failed: {0}")]
pub struct PermissionError(Arc<FrappeError>);

impl PermissionError {
    /// The underlying backend failure.
    #[must_use]
    pub fn backend_error(&self) -> &FrappeError {
        &self.0
    }
}

impl From<FrappeError> for PermissionError {
    fn from(err: FrappeError) -> Self {
        Self(Arc::new(err))
    }
}

/// Resolves identities to role classes.
///
/// Holds the only cross-view mutable shared state in the client: the role
/// cache. Reads come from any component needing role gating; writes happen
/// only here.
pub struct PermissionResolver {
    backend: Arc<dyn LmsBackend>,
    cache: CoalescingCache<Identity, RoleResolution>,
}

impl PermissionResolver {
    /// Create a resolver with the standard 5-minute TTL.
    #[must_use]
    pub fn new(backend: Arc<dyn LmsBackend>) -> Self {
        Self::with_ttl(backend, ROLE_CACHE_TTL)
    }

    /// Create a resolver with a custom TTL.
    #[must_use]
    pub fn with_ttl(backend: Arc<dyn LmsBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            cache: CoalescingCache::new(ROLE_CACHE_CAPACITY, ttl),
        }
    }

    /// Resolve the role for an identity.
    ///
    /// A cache hit within the TTL answers without any network call. On a
    /// miss, exactly one remote lookup runs per identity regardless of how
    /// many callers are waiting. A definite "no role assigned" answer is
    /// cached like any other; transient failures are not.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError`] when the lookup fails; the caller decides
    /// when to retry (navigation, explicit refresh).
    pub async fn resolve(&self, identity: &Identity) -> Result<RoleResolution, PermissionError> {
        let backend = Arc::clone(&self.backend);
        let lookup = identity.clone();
        self.cache
            .get_or_resolve(identity.clone(), async move {
                resolve_remote(backend.as_ref(), &lookup).await
            })
            .await
            .map_err(|shared| (*shared).clone())
    }

    /// Drop any cached entry and resolve again.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError`] when the fresh lookup fails.
    pub async fn refresh(&self, identity: &Identity) -> Result<RoleResolution, PermissionError> {
        self.invalidate(identity).await;
        self.resolve(identity).await
    }

    /// Forget the cached role for one identity.
    ///
    /// Called on logout and after role-changing actions.
    pub async fn invalidate(&self, identity: &Identity) {
        self.cache.invalidate(identity).await;
    }

    /// Forget every cached role.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

impl std::fmt::Debug for PermissionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionResolver")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// One remote role lookup.
///
/// The permission RPC is authoritative. Backends without the LMS app's API
/// answer 404 for it; only then does the resolver fall back to scanning the
/// membership lists in priority order. Any other failure is transient and
/// must not silently switch sources.
async fn resolve_remote(
    backend: &dyn LmsBackend,
    identity: &Identity,
) -> Result<RoleResolution, PermissionError> {
    match backend.fetch_user_permissions(identity).await {
        Ok(Some(role)) => {
            tracing::debug!(identity = %identity, role = %role, "role resolved via permissions RPC");
            Ok(RoleResolution::Resolved(role))
        }
        Ok(None) => {
            tracing::debug!(identity = %identity, "backend reports no LMS role");
            Ok(RoleResolution::NoRoleAssigned)
        }
        Err(FrappeError::MethodNotFound(method)) => {
            tracing::debug!(%method, "permissions RPC missing, scanning membership lists");
            let lists = backend.fetch_role_lists().await.map_err(PermissionError::from)?;
            Ok(lists
                .classify(identity)
                .map_or(RoleResolution::NoRoleAssigned, RoleResolution::Resolved))
        }
        Err(err) => Err(err.into()),
    }
}
