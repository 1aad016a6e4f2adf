//! Client token generation.
//!
//! A token grants a [`Role`] within one session for a bounded time. It is
//! minted locally from the partner credentials; the platform verifies the
//! HMAC when a client connects.
//!
//! # Components
//!
//! - `session_id` - checks the session belongs to the signing partner
//! - `encoder` - builds, signs and wraps the canonical parameter string

pub mod encoder;
pub mod session_id;

use crate::errors::OpenTokError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use encoder::{canonical_string, encode_token, TokenParams};
pub use session_id::validate_session_id;

/// Permission tier granted by a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can only subscribe to streams.
    Subscriber,
    /// Can publish, subscribe, and signal.
    #[default]
    Publisher,
    /// Publisher rights plus force-disconnect and force-unpublish.
    Moderator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Subscriber => "subscriber",
            Role::Publisher => "publisher",
            Role::Moderator => "moderator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = OpenTokError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subscriber" => Ok(Role::Subscriber),
            "publisher" => Ok(Role::Publisher),
            "moderator" => Ok(Role::Moderator),
            other => Err(OpenTokError::InvalidRole(other.to_string())),
        }
    }
}

/// Token expiry as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpireTime {
    /// An absolute point in time.
    At(DateTime<Utc>),
    /// Unix timestamp in seconds.
    Timestamp(i64),
    /// Unparsed text that must hold an integer Unix timestamp.
    Text(String),
}

impl ExpireTime {
    /// Resolve to a Unix timestamp in seconds.
    ///
    /// # Errors
    ///
    /// Returns `OpenTokError::InvalidExpireTime` if `Text` is not an integer.
    pub fn to_timestamp(&self) -> Result<i64, OpenTokError> {
        match self {
            ExpireTime::At(at) => Ok(at.timestamp()),
            ExpireTime::Timestamp(ts) => Ok(*ts),
            ExpireTime::Text(raw) => raw
                .trim()
                .parse()
                .map_err(|_| OpenTokError::InvalidExpireTime("Expire time must be a number".into())),
        }
    }
}

impl From<DateTime<Utc>> for ExpireTime {
    fn from(at: DateTime<Utc>) -> Self {
        ExpireTime::At(at)
    }
}

impl From<i64> for ExpireTime {
    fn from(ts: i64) -> Self {
        ExpireTime::Timestamp(ts)
    }
}

impl From<&str> for ExpireTime {
    fn from(raw: &str) -> Self {
        ExpireTime::Text(raw.to_string())
    }
}

impl From<String> for ExpireTime {
    fn from(raw: String) -> Self {
        ExpireTime::Text(raw)
    }
}

/// Optional token settings.
///
/// # Example
///
/// ```rust
/// use opentok::token::{Role, TokenOptions};
///
/// let options = TokenOptions::new()
///     .with_role(Role::Moderator)
///     .with_expire_time(chrono::Utc::now() + chrono::Duration::hours(1))
///     .with_connection_data("name=alice");
/// assert_eq!(options.role, Some(Role::Moderator));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenOptions {
    /// Defaults to [`Role::Publisher`].
    pub role: Option<Role>,

    /// Defaults to the platform's own expiry (24 hours).
    pub expire_time: Option<ExpireTime>,

    /// Metadata describing the end user, at most 1000 characters.
    pub connection_data: Option<String>,
}

impl TokenOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    #[must_use]
    pub fn with_expire_time(mut self, expire_time: impl Into<ExpireTime>) -> Self {
        self.expire_time = Some(expire_time.into());
        self
    }

    #[must_use]
    pub fn with_connection_data(mut self, data: impl Into<String>) -> Self {
        self.connection_data = Some(data.into());
        self
    }
}
