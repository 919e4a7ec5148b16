//! Core types for the Novel LMS client.
//!
//! Newtype wrappers and enums shared by the client and CLI crates:
//!
//! - [`Identity`] - Validated user handle (email or service account name)
//! - [`RoleClass`] / [`RoleResolution`] - Role classification results
//! - [`ModuleProgress`] / [`ModuleStatus`] - Progress data and normalization
//! - [`Route`] - Client routes and role-based landing selection

mod identity;
mod progress;
mod role;
mod route;

pub use identity::{Identity, IdentityError};
pub use progress::{
    ModuleProgress, ModuleStatus, ProgressStats, average_progress, module_progress, normalize,
    progress_stats,
};
pub use role::{RoleClass, RoleResolution};
pub use route::Route;
