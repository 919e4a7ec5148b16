//! Client routes and landing selection.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::RoleClass;

/// Top-level client routes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Route {
    /// Admin home dashboard.
    Home,
    /// Module authoring list.
    Modules,
    /// Learner-facing dashboard.
    LearnerDashboard,
    /// Login screen.
    Login,
}

impl Route {
    /// Returns the route's path.
    #[must_use]
    pub const fn as_path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Modules => "/modules",
            Self::LearnerDashboard => "/learner-dashboard",
            Self::Login => "/login",
        }
    }

    /// Landing route for a freshly resolved role.
    ///
    /// Team leads land on the learner dashboard; they have no dedicated
    /// surface. Users without a recognized role never reach this mapping -
    /// the session gate sends them back to [`Route::Login`].
    #[must_use]
    pub const fn landing_for(role: RoleClass) -> Self {
        match role {
            RoleClass::Admin => Self::Home,
            RoleClass::ContentEditor => Self::Modules,
            RoleClass::Student | RoleClass::TeamLead => Self::LearnerDashboard,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}
