//! Application state shared across views.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use secrecy::SecretString;

use novel_lms_core::{Identity, ModuleProgress, ModuleStatus, ProgressStats, progress_stats};

use crate::backend::LmsBackend;
use crate::config::LmsConfig;
use crate::error::{ClientError, Result};
use crate::frappe::FrappeClient;
use crate::history::{HistoryEntry, NavigationHistory};
use crate::permissions::PermissionResolver;
use crate::session::{AuthError, LoginOutcome, SessionGate};

/// Per-module line of a member's progress report.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleProgressLine {
    /// Module the enrollment refers to.
    pub module: String,
    /// Canonical percentage on the 0-100 scale.
    pub percent: f64,
    /// Status tag, when the backend stored one.
    pub status: Option<ModuleStatus>,
}

/// A member's modules with aggregate statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberProgressReport {
    /// One line per enrollment, in backend order.
    pub modules: Vec<ModuleProgressLine>,
    /// Counts and average over all modules.
    pub stats: ProgressStats,
}

/// Application state shared across all views.
///
/// Cheaply cloneable via `Arc`; wires the configuration, the backend
/// client, the session gate, the permission resolver, and the navigation
/// history together.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: LmsConfig,
    backend: Arc<dyn LmsBackend>,
    resolver: Arc<PermissionResolver>,
    gate: SessionGate,
    history: Mutex<NavigationHistory>,
}

impl AppState {
    /// Create application state talking to the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: LmsConfig) -> Result<Self> {
        let backend: Arc<dyn LmsBackend> = Arc::new(FrappeClient::new(&config)?);
        Ok(Self::with_backend(config, backend))
    }

    /// Create application state over an arbitrary backend.
    ///
    /// Tests inject in-memory backends here.
    #[must_use]
    pub fn with_backend(config: LmsConfig, backend: Arc<dyn LmsBackend>) -> Self {
        let resolver = Arc::new(PermissionResolver::new(Arc::clone(&backend)));
        let gate = SessionGate::new(Arc::clone(&backend), Arc::clone(&resolver));
        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                resolver,
                gate,
                history: Mutex::new(NavigationHistory::new()),
            }),
        }
    }

    /// Get a reference to the client configuration.
    #[must_use]
    pub fn config(&self) -> &LmsConfig {
        &self.inner.config
    }

    /// Get a reference to the session gate.
    #[must_use]
    pub fn session(&self) -> &SessionGate {
        &self.inner.gate
    }

    /// Get a reference to the permission resolver.
    #[must_use]
    pub fn permissions(&self) -> &PermissionResolver {
        &self.inner.resolver
    }

    /// Sign in and, on success, hard-reset navigation state.
    ///
    /// Role-changing navigation must not carry stale view state, so the
    /// history is cleared and re-seeded with the landing route.
    ///
    /// # Errors
    ///
    /// Propagates [`AuthError`] from the session gate.
    pub async fn login(
        &self,
        identity: &Identity,
        secret: &SecretString,
    ) -> std::result::Result<LoginOutcome, AuthError> {
        let outcome = self.inner.gate.login(identity, secret).await?;
        if let LoginOutcome::SignedIn { destination, .. } = &outcome {
            let mut history = self.lock_history();
            history.clear();
            history.push(HistoryEntry::new(destination.as_path()));
        }
        Ok(outcome)
    }

    /// Sign out and drop navigation state.
    ///
    /// # Errors
    ///
    /// Propagates [`AuthError`] from the session gate.
    pub async fn logout(&self) -> std::result::Result<(), AuthError> {
        self.inner.gate.logout().await?;
        self.lock_history().clear();
        Ok(())
    }

    /// Record a visit in the navigation history.
    pub fn record_visit(&self, entry: HistoryEntry) {
        self.lock_history().push(entry);
    }

    /// The most recent visit before the current one that had a module open.
    #[must_use]
    pub fn previous_module_visit(&self) -> Option<HistoryEntry> {
        self.lock_history().previous_module().cloned()
    }

    /// Snapshot of the history, oldest to newest.
    #[must_use]
    pub fn history_snapshot(&self) -> Vec<HistoryEntry> {
        self.lock_history().iter().cloned().collect()
    }

    /// Fetch a member's enrollments and compute the normalized report.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Backend`] when the enrollment fetch fails.
    pub async fn member_progress(&self, member: &Identity) -> Result<MemberProgressReport> {
        let docs = self
            .inner
            .backend
            .fetch_enrollments(member)
            .await
            .map_err(ClientError::Backend)?;

        let progress: Vec<ModuleProgress> = docs.iter().map(|doc| doc.to_progress()).collect();
        let stats = progress_stats(&progress);
        let modules = docs
            .iter()
            .zip(&progress)
            .map(|(doc, p)| ModuleProgressLine {
                module: doc.module.clone(),
                percent: novel_lms_core::module_progress(p),
                status: p.status,
            })
            .collect();

        Ok(MemberProgressReport { modules, stats })
    }

    fn lock_history(&self) -> MutexGuard<'_, NavigationHistory> {
        self.inner
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("session", &self.inner.gate)
            .finish_non_exhaustive()
    }
}
