//! Validation error model.

use thiserror::Error;

/// Result type used by input validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Client-attributable input failure.
///
/// Every variant is safe to return to the caller: messages never contain more
/// than the caller already sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The payload was not a JSON object (or not JSON at all).
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// `user_id` missing, not a string, or blank after trimming.
    #[error("user_id required")]
    MissingUserId,

    /// `role` missing or not one of the known roles.
    ///
    /// The rejected value is kept for logs; it is not part of the message.
    #[error("unknown role")]
    UnknownRole(String),

    /// `permissions` present but not an array of strings.
    #[error("permissions must be an array of strings")]
    InvalidPermissions,

    /// `session_id` present but not a string.
    #[error("session_id must be a string")]
    InvalidSessionId,

    /// `timestamp` present but not an ISO-8601 instant.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

impl ValidationError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub fn unknown_role(raw: impl Into<String>) -> Self {
        Self::UnknownRole(raw.into())
    }

    /// Name of the offending input field (`"body"` for whole-payload failures).
    pub fn field(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "body",
            Self::MissingUserId => "user_id",
            Self::UnknownRole(_) => "role",
            Self::InvalidPermissions => "permissions",
            Self::InvalidSessionId => "session_id",
            Self::InvalidTimestamp(_) => "timestamp",
        }
    }
}
