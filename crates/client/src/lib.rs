//! Novel LMS client library.
//!
//! A thin client-state layer over a remote Frappe/LMS document backend.
//! Three cooperating pieces:
//!
//! - [`session::SessionGate`] - login/logout state machine, current-user
//!   identity, and role-derived landing-route selection
//! - [`permissions::PermissionResolver`] - identity to role classification,
//!   fronted by a TTL-bounded, request-coalescing cache
//! - progress normalization - pure functions re-exported from
//!   `novel_lms_core`, applied to fetched enrollment documents
//!
//! The backend is reached over HTTP with cookie sessions; the reqwest cookie
//! jar is the session store. All remote access goes through the
//! [`backend::LmsBackend`] trait, so every stateful piece can be exercised
//! against an in-memory backend in tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod frappe;
pub mod history;
pub mod permissions;
pub mod session;
pub mod state;

pub use backend::LmsBackend;
pub use config::LmsConfig;
pub use error::{ClientError, Result};
pub use frappe::FrappeClient;
pub use history::{HistoryEntry, NavigationHistory, ViewContext};
pub use permissions::{PermissionError, PermissionResolver};
pub use session::{AuthError, CurrentUser, LoginOutcome, SessionGate, SessionState};
pub use state::AppState;
