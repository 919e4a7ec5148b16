//! Wire types for the Frappe document API.
//!
//! Resource reads come back wrapped in a `data` envelope, RPC methods in a
//! `message` envelope. Documents are deserialized leniently: missing fields
//! default rather than fail, because the backend omits empty values.

use serde::{Deserialize, Serialize};

use novel_lms_core::{Identity, ModuleProgress, ModuleStatus, RoleClass};

/// Envelope for `/api/resource/...` responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ResourceEnvelope<T> {
    pub data: T,
}

/// Envelope for `/api/method/...` responses.
#[derive(Debug, Deserialize)]
pub(crate) struct MethodEnvelope<T> {
    pub message: T,
}

/// Error payload shape returned by the backend on failures.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorPayload {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub exception: Option<String>,
}

/// Result payload of the `get_user_lms_permissions` RPC.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct UserPermissionsMessage {
    /// Role tag, absent or empty when the user has no LMS role.
    #[serde(default)]
    pub user_type: Option<String>,
}

/// User document (`/api/resource/User/{name}`).
#[derive(Debug, Clone, Deserialize)]
pub struct UserDoc {
    /// Canonical identity; the document name.
    pub name: Identity,
    /// Display name, when set.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Avatar URL, when set.
    #[serde(default)]
    pub user_image: Option<String>,
}

/// Child row in the LMS Users membership lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRow {
    /// Identity of the member.
    pub user: Identity,
}

/// The LMS Users singleton document: role membership child lists.
///
/// Lists the backend has never populated are simply absent from the
/// document, so every list defaults to empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleListsDoc {
    #[serde(default)]
    pub lms_admin: Vec<MemberRow>,
    #[serde(default)]
    pub lms_content_editor: Vec<MemberRow>,
    #[serde(default)]
    pub lms_student: Vec<MemberRow>,
    #[serde(default)]
    pub lms_team_lead: Vec<MemberRow>,
}

impl RoleListsDoc {
    /// Classify an identity by scanning the lists in fixed priority order
    /// (admin, then content editor, then student, then team lead).
    #[must_use]
    pub fn classify(&self, identity: &Identity) -> Option<RoleClass> {
        for role in RoleClass::PRIORITY {
            if self.members_of(role).iter().any(|row| row.user == *identity) {
                return Some(role);
            }
        }
        None
    }

    fn members_of(&self, role: RoleClass) -> &[MemberRow] {
        match role {
            RoleClass::Admin => &self.lms_admin,
            RoleClass::ContentEditor => &self.lms_content_editor,
            RoleClass::Student => &self.lms_student,
            RoleClass::TeamLead => &self.lms_team_lead,
        }
    }
}

/// Enrollment document row (`/api/resource/LMS Enrollment`).
#[derive(Debug, Clone, Deserialize)]
pub struct EnrollmentDoc {
    /// Document name of the enrollment row.
    pub name: String,
    /// Module the enrollment refers to.
    pub module: String,
    #[serde(default)]
    pub status: Option<ModuleStatus>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub overall_progress: Option<f64>,
}

impl EnrollmentDoc {
    /// Progress view of this enrollment for the normalizer.
    #[must_use]
    pub const fn to_progress(&self) -> ModuleProgress {
        ModuleProgress {
            status: self.status,
            progress: self.progress,
            overall_progress: self.overall_progress,
        }
    }
}
