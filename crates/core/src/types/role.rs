//! Role classification types.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Role class assigned to an LMS user.
///
/// Exactly one role applies per identity at a time. The wire tags match the
/// backend's `user_type` values (`admin`, `content_editor`, `student`, `tl`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RoleClass {
    /// Full administrative access.
    Admin,
    /// Can author and edit course modules.
    ContentEditor,
    /// Consumes course content and tracks progress.
    Student,
    /// Leads a team of learners.
    #[serde(rename = "tl")]
    TeamLead,
}

impl RoleClass {
    /// Fixed priority order used when classifying from membership lists.
    ///
    /// A user appearing in several lists gets the first matching role.
    pub const PRIORITY: [Self; 4] = [
        Self::Admin,
        Self::ContentEditor,
        Self::Student,
        Self::TeamLead,
    ];

    /// Returns the backend wire tag for this role.
    #[must_use]
    pub const fn as_tag(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::ContentEditor => "content_editor",
            Self::Student => "student",
            Self::TeamLead => "tl",
        }
    }

    /// Parse a backend wire tag into a role class.
    ///
    /// Returns `None` for unknown or empty tags; callers treat those as
    /// "no recognized role".
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "admin" => Some(Self::Admin),
            "content_editor" => Some(Self::ContentEditor),
            "student" => Some(Self::Student),
            "tl" => Some(Self::TeamLead),
            _ => None,
        }
    }
}

impl fmt::Display for RoleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Outcome of a successful role lookup.
///
/// An authenticated user without any LMS role is a valid, cacheable answer
/// (`NoRoleAssigned`) and is never represented the same way as a transient
/// lookup failure, which surfaces as an error at the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleResolution {
    /// The backend classified the user into a role.
    Resolved(RoleClass),
    /// The user is authenticated but has no recognized LMS role.
    NoRoleAssigned,
}

impl RoleResolution {
    /// Returns the resolved role, if any.
    #[must_use]
    pub const fn role(self) -> Option<RoleClass> {
        match self {
            Self::Resolved(role) => Some(role),
            Self::NoRoleAssigned => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_tags_roundtrip() {
        for role in RoleClass::PRIORITY {
            assert_eq!(RoleClass::from_tag(role.as_tag()), Some(role));
        }
    }

    #[test]
    fn test_team_lead_tag() {
        assert_eq!(RoleClass::TeamLead.as_tag(), "tl");
        assert_eq!(RoleClass::from_tag("tl"), Some(RoleClass::TeamLead));
    }

    #[test]
    fn test_unknown_tag() {
        assert_eq!(RoleClass::from_tag("moderator"), None);
        assert_eq!(RoleClass::from_tag(""), None);
    }

    #[test]
    fn test_serde_uses_wire_tags() {
        assert_eq!(
            serde_json::to_string(&RoleClass::ContentEditor).unwrap(),
            "\"content_editor\""
        );
        assert_eq!(
            serde_json::to_string(&RoleClass::TeamLead).unwrap(),
            "\"tl\""
        );

        let parsed: RoleClass = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(parsed, RoleClass::Admin);
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(
            RoleClass::PRIORITY,
            [
                RoleClass::Admin,
                RoleClass::ContentEditor,
                RoleClass::Student,
                RoleClass::TeamLead,
            ]
        );
    }

    #[test]
    fn test_resolution_role() {
        assert_eq!(
            RoleResolution::Resolved(RoleClass::Student).role(),
            Some(RoleClass::Student)
        );
        assert_eq!(RoleResolution::NoRoleAssigned.role(), None);
    }
}
