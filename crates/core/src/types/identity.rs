//! User identity type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Identity`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum IdentityError {
    /// The input string is empty.
    #[error("identity cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("identity must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains whitespace or a control character.
    #[error("identity contains an invalid character")]
    InvalidCharacter,
}

/// An opaque user handle as known to the LMS backend.
///
/// Usually an email address, but service accounts like `Administrator` are
/// valid user names too, so no email structure is enforced. The backend owns
/// the canonical value; the client only holds copies of it.
///
/// ## Constraints
///
/// - Length: 1-140 characters (backend document-name limit)
/// - No whitespace or control characters
///
/// ## Examples
///
/// ```
/// use novel_lms_core::Identity;
///
/// assert!(Identity::parse("student@example.com").is_ok());
/// assert!(Identity::parse("Administrator").is_ok());
///
/// assert!(Identity::parse("").is_err());
/// assert!(Identity::parse("two words").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Maximum length of an identity (backend document-name limit).
    pub const MAX_LENGTH: usize = 140;

    /// Parse an `Identity` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty
    /// - Is longer than 140 characters
    /// - Contains whitespace or control characters
    pub fn parse(s: &str) -> Result<Self, IdentityError> {
        if s.is_empty() {
            return Err(IdentityError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(IdentityError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(IdentityError::InvalidCharacter);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Identity` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
