//! Frappe document API client.
//!
//! # Architecture
//!
//! - The backend is the source of truth - no local sync, direct API calls
//! - Authentication is an HTTP session cookie; the reqwest cookie jar is the
//!   session store, so every request rides the ambient session
//! - Resource reads (`/api/resource/...`) and RPC methods
//!   (`/api/method/...`) share one client and one error taxonomy
//!
//! # Example
//!
//! ```rust,ignore
//! use novel_lms_client::{FrappeClient, LmsConfig};
//!
//! let client = FrappeClient::new(&LmsConfig::from_env()?)?;
//! client.login(&identity, &password).await?;
//! let user = client.get_user(&identity).await?;
//! ```

pub mod types;

pub use types::{EnrollmentDoc, MemberRow, RoleListsDoc, UserDoc};

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use novel_lms_core::{Identity, RoleClass};

use crate::backend::LmsBackend;
use crate::config::LmsConfig;
use types::{ErrorPayload, MethodEnvelope, ResourceEnvelope, UserPermissionsMessage};

/// The backend's anonymous user name.
pub const GUEST_USER: &str = "Guest";

/// RPC method that classifies a user's LMS role (authoritative source).
const USER_PERMISSIONS_METHOD: &str = "novel_lms.api.user_permissions.get_user_lms_permissions";

/// RPC method returning the identity the session cookie belongs to.
const LOGGED_USER_METHOD: &str = "frappe.auth.get_logged_user";

/// Errors that can occur when talking to the LMS backend.
#[derive(Debug, Error)]
pub enum FrappeError {
    /// HTTP transport failure, including request timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be parsed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Login rejected by the backend.
    #[error("login rejected: {0}")]
    AuthenticationFailed(String),

    /// The session cookie is no longer valid for an authenticated call.
    #[error("session expired or not permitted")]
    SessionExpired,

    /// RPC method does not exist on this backend.
    #[error("no such method: {0}")]
    MethodNotFound(String),

    /// Document or resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other server-reported failure.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
}

// =============================================================================
// FrappeClient
// =============================================================================

/// Client for the Frappe document API.
///
/// Cheaply cloneable; all clones share one cookie jar and connection pool.
#[derive(Clone)]
pub struct FrappeClient {
    inner: Arc<FrappeClientInner>,
}

struct FrappeClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl FrappeClient {
    /// Create a new client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `FrappeError::Http` if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: &LmsConfig) -> Result<Self, FrappeError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(FrappeClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// Authenticate and establish a session cookie.
    ///
    /// # Errors
    ///
    /// Returns `FrappeError::AuthenticationFailed` when the backend rejects
    /// the credentials, `FrappeError::Http` on transport failure.
    pub async fn login(&self, identity: &Identity, secret: &SecretString) -> Result<(), FrappeError> {
        let url = self.api_url(&["api", "method", "login"]);
        tracing::debug!(identity = %identity, "logging in");

        let response = self
            .inner
            .client
            .post(url)
            .form(&[("usr", identity.as_str()), ("pwd", secret.expose_secret())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(());
        }

        // The backend answers 401 for wrong credentials and 417 for some
        // validation failures; both carry a human-readable message.
        if matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::EXPECTATION_FAILED
        ) {
            return Err(FrappeError::AuthenticationFailed(error_message(&body)));
        }

        tracing::error!(
            status = %status,
            body = %excerpt(&body),
            "login returned unexpected status"
        );
        Err(FrappeError::Server {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }

    /// Tear down the backend session.
    ///
    /// # Errors
    ///
    /// Returns `FrappeError` on transport or server failure.
    pub async fn logout(&self) -> Result<(), FrappeError> {
        let url = self.api_url(&["api", "method", "logout"]);
        tracing::debug!("logging out");

        let response = self.inner.client.post(url).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await?;
        Err(status_error(status, &body, || {
            FrappeError::NotFound("logout".to_string())
        }))
    }

    /// Fetch a user document by identity.
    ///
    /// # Errors
    ///
    /// Returns `FrappeError::NotFound` for unknown users and
    /// `FrappeError::SessionExpired` when the session cookie is invalid.
    pub async fn get_user(&self, identity: &Identity) -> Result<UserDoc, FrappeError> {
        let url = self.api_url(&["api", "resource", "User", identity.as_str()]);
        let envelope: ResourceEnvelope<UserDoc> = self
            .get_json(url, || FrappeError::NotFound(format!("User/{identity}")))
            .await?;
        Ok(envelope.data)
    }

    /// Fetch the LMS Users singleton with its role membership lists.
    ///
    /// # Errors
    ///
    /// Returns `FrappeError` on transport, session, or server failure.
    pub async fn get_role_lists(&self) -> Result<RoleListsDoc, FrappeError> {
        let url = self.api_url(&["api", "resource", "LMS Users", "LMS Users"]);
        let envelope: ResourceEnvelope<RoleListsDoc> = self
            .get_json(url, || FrappeError::NotFound("LMS Users".to_string()))
            .await?;
        Ok(envelope.data)
    }

    /// Ask the backend's permission RPC for a user's role tag.
    ///
    /// Returns `None` when the user has no recognized LMS role.
    ///
    /// # Errors
    ///
    /// Returns `FrappeError::MethodNotFound` when the backend does not carry
    /// the LMS app's API (callers fall back to the membership-list scan).
    pub async fn get_user_permissions(
        &self,
        identity: &Identity,
    ) -> Result<Option<RoleClass>, FrappeError> {
        let mut url = self.api_url(&["api", "method", USER_PERMISSIONS_METHOD]);
        url.query_pairs_mut().append_pair("user", identity.as_str());

        let envelope: MethodEnvelope<UserPermissionsMessage> = self
            .get_json(url, || {
                FrappeError::MethodNotFound(USER_PERMISSIONS_METHOD.to_string())
            })
            .await?;

        let Some(tag) = envelope.message.user_type else {
            return Ok(None);
        };
        let role = RoleClass::from_tag(&tag);
        if role.is_none() && !tag.is_empty() {
            tracing::debug!(user_type = %tag, "unrecognized role tag from backend");
        }
        Ok(role)
    }

    /// Ask the backend which identity the session cookie belongs to.
    ///
    /// # Errors
    ///
    /// Fails once the session is gone; immediately after logout this is the
    /// expected outcome and callers treat it as benign.
    pub async fn get_logged_user(&self) -> Result<Identity, FrappeError> {
        let url = self.api_url(&["api", "method", LOGGED_USER_METHOD]);
        let envelope: MethodEnvelope<Identity> = self
            .get_json(url, || {
                FrappeError::MethodNotFound(LOGGED_USER_METHOD.to_string())
            })
            .await?;
        Ok(envelope.message)
    }

    /// Fetch all enrollment rows for a member.
    ///
    /// # Errors
    ///
    /// Returns `FrappeError` on transport, session, or server failure.
    pub async fn list_enrollments(
        &self,
        member: &Identity,
    ) -> Result<Vec<EnrollmentDoc>, FrappeError> {
        let mut url = self.api_url(&["api", "resource", "LMS Enrollment"]);
        let filters = serde_json::json!([["member", "=", member.as_str()]]).to_string();
        let fields =
            serde_json::json!(["name", "module", "status", "progress", "overall_progress"])
                .to_string();
        url.query_pairs_mut()
            .append_pair("filters", &filters)
            .append_pair("fields", &fields)
            .append_pair("limit_page_length", "0");

        let envelope: ResourceEnvelope<Vec<EnrollmentDoc>> = self
            .get_json(url, || FrappeError::NotFound("LMS Enrollment".to_string()))
            .await?;
        Ok(envelope.data)
    }

    /// GET a URL and parse the JSON body, mapping non-success statuses.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        on_not_found: impl FnOnce() -> FrappeError,
    ) -> Result<T, FrappeError> {
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %excerpt(&body),
                "LMS API returned non-success status"
            );
            return Err(status_error(status, &body, on_not_found));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %excerpt(&body),
                "failed to parse LMS response"
            );
            FrappeError::Parse(e)
        })
    }

    /// Build a URL from the configured base plus path segments.
    ///
    /// Segments are percent-encoded, so doctype names with spaces are safe.
    fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.inner.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }
}

#[async_trait]
impl LmsBackend for FrappeClient {
    async fn login(&self, identity: &Identity, secret: &SecretString) -> Result<(), FrappeError> {
        Self::login(self, identity, secret).await
    }

    async fn logout(&self) -> Result<(), FrappeError> {
        Self::logout(self).await
    }

    async fn fetch_user(&self, identity: &Identity) -> Result<UserDoc, FrappeError> {
        self.get_user(identity).await
    }

    async fn fetch_logged_user(&self) -> Result<Identity, FrappeError> {
        self.get_logged_user().await
    }

    async fn fetch_role_lists(&self) -> Result<RoleListsDoc, FrappeError> {
        self.get_role_lists().await
    }

    async fn fetch_user_permissions(
        &self,
        identity: &Identity,
    ) -> Result<Option<RoleClass>, FrappeError> {
        self.get_user_permissions(identity).await
    }

    async fn fetch_enrollments(
        &self,
        member: &Identity,
    ) -> Result<Vec<EnrollmentDoc>, FrappeError> {
        self.list_enrollments(member).await
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Map a non-success status to an error.
fn status_error(
    status: StatusCode,
    body: &str,
    on_not_found: impl FnOnce() -> FrappeError,
) -> FrappeError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FrappeError::SessionExpired,
        StatusCode::NOT_FOUND => on_not_found(),
        _ => FrappeError::Server {
            status: status.as_u16(),
            message: error_message(body),
        },
    }
}

/// Extract the most useful human-readable message from an error body.
fn error_message(body: &str) -> String {
    let payload: ErrorPayload = serde_json::from_str(body).unwrap_or_default();
    if let Some(message) = payload.message
        && !message.is_empty()
    {
        return message;
    }
    if let Some(exception) = payload.exception {
        // Exceptions arrive as "module.Type: detail" with a traceback tail.
        if let Some(first_line) = exception.lines().next() {
            return first_line.to_string();
        }
    }
    excerpt(body)
}

/// First 200 characters of a body, for logs and fallback messages.
fn excerpt(body: &str) -> String {
    body.chars().take(200).collect()
}
