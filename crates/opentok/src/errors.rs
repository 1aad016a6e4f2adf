//! OpenTok SDK error types.
//!
//! Every failure surfaced by the SDK is a variant of [`OpenTokError`], so
//! callers can match narrowly on a single kind or treat them all alike.
//!
//! Status code mapping for remote failures:
//! - AuthFailed: 403 Forbidden
//! - InvalidSession: 400 Bad Request
//! - SessionNotFound, ArchiveNotFound: 404 Not Found
//! - ArchiveError: 409 Conflict
//! - RequestFailed: whatever the platform returned, if anything

use thiserror::Error;

/// OpenTok SDK error type.
#[derive(Debug, Error)]
pub enum OpenTokError {
    #[error("Null or empty session ID are not valid")]
    EmptySessionId,

    #[error("An invalid session ID was passed")]
    InvalidSessionId,

    #[error("{0} is not a valid role")]
    InvalidRole(String),

    #[error("Invalid expire time: {0}")]
    InvalidExpireTime(String),

    #[error("Connection data must be less than 1000 characters (got {length})")]
    ConnectionDataTooLong { length: usize },

    #[error("Authentication failed: {message}")]
    AuthFailed {
        /// Platform error code, when the platform supplied one.
        code: Option<String>,
        message: String,
    },

    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Archive not found: {0}")]
    ArchiveNotFound(String),

    #[error("Archive error: {0}")]
    ArchiveError(String),

    #[error("Request failed: {message}")]
    RequestFailed {
        status: Option<u16>,
        message: String,
    },

    #[error("OpenTok platform error: {0}")]
    PlatformError(String),
}

impl OpenTokError {
    /// Returns the HTTP status code associated with this error, if any.
    ///
    /// Validation errors are detected locally and never have one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            OpenTokError::AuthFailed { .. } => Some(403),
            OpenTokError::InvalidSession(_) => Some(400),
            OpenTokError::SessionNotFound(_) | OpenTokError::ArchiveNotFound(_) => Some(404),
            OpenTokError::ArchiveError(_) => Some(409),
            OpenTokError::RequestFailed { status, .. } => *status,
            OpenTokError::EmptySessionId
            | OpenTokError::InvalidSessionId
            | OpenTokError::InvalidRole(_)
            | OpenTokError::InvalidExpireTime(_)
            | OpenTokError::ConnectionDataTooLong { .. }
            | OpenTokError::PlatformError(_) => None,
        }
    }

    /// True for input problems caught before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            OpenTokError::EmptySessionId
                | OpenTokError::InvalidSessionId
                | OpenTokError::InvalidRole(_)
                | OpenTokError::InvalidExpireTime(_)
                | OpenTokError::ConnectionDataTooLong { .. }
        )
    }

    pub(crate) fn auth_failed(message: impl Into<String>) -> Self {
        OpenTokError::AuthFailed {
            code: None,
            message: message.into(),
        }
    }

    pub(crate) fn request_failed(status: Option<u16>, message: impl Into<String>) -> Self {
        OpenTokError::RequestFailed {
            status,
            message: message.into(),
        }
    }
}

/// Result type alias using `OpenTokError`
pub type Result<T> = std::result::Result<T, OpenTokError>;
