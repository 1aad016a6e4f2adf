//! The OpenTok client.
//!
//! [`OpenTok`] holds the partner credentials and a transport, and is the
//! entry point for every operation: token generation happens locally,
//! session and archive operations issue exactly one platform request each.

use crate::config::{Credentials, OpenTokConfig};
use crate::crypto::generate_nonce;
use crate::errors::OpenTokError;
use crate::models::{Archive, ArchiveList, Session, SessionProperties};
use crate::services::{ArchiveClient, ReqwestTransport, SessionClient, Transport};
use crate::token::{encode_token, TokenOptions};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;

/// Client for the OpenTok platform.
///
/// Cheap to clone; clones share the configuration and the transport.
///
/// # Example
///
/// ```rust,no_run
/// use opentok::{OpenTok, Role, SessionProperties, TokenOptions};
///
/// # async fn run() -> opentok::Result<()> {
/// let opentok = OpenTok::new("123456", "partner-secret")?;
///
/// let session = opentok
///     .create_session(None, &SessionProperties::default())
///     .await?;
/// let token = session.generate_token(
///     &opentok,
///     &TokenOptions::new().with_role(Role::Moderator),
/// )?;
/// # let _ = token;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct OpenTok {
    config: Arc<OpenTokConfig>,
    sessions: SessionClient,
    archives: ArchiveClient,
}

impl OpenTok {
    /// Create a client for the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns `RequestFailed` if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, api_secret: impl AsRef<str>) -> Result<Self, OpenTokError> {
        Self::from_config(OpenTokConfig::new(api_key, api_secret))
    }

    /// Create a client from a full configuration, using a reqwest transport
    /// with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns `RequestFailed` if the HTTP client cannot be built.
    pub fn from_config(config: OpenTokConfig) -> Result<Self, OpenTokError> {
        let transport = ReqwestTransport::new(config.request_timeout, config.connect_timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client that sends requests through `transport`.
    pub fn with_transport(config: OpenTokConfig, transport: Arc<dyn Transport>) -> Self {
        let config = Arc::new(config);
        Self {
            sessions: SessionClient::new(config.clone(), transport.clone()),
            archives: ArchiveClient::new(config.clone(), transport),
            config,
        }
    }

    pub fn api_key(&self) -> &str {
        self.config.credentials.api_key()
    }

    pub fn credentials(&self) -> &Credentials {
        &self.config.credentials
    }

    pub fn config(&self) -> &OpenTokConfig {
        &self.config
    }

    /// Generate a token granting access to `session_id`.
    ///
    /// Uses the current time as the creation time and a fresh random nonce.
    ///
    /// # Errors
    ///
    /// - `EmptySessionId` / `InvalidSessionId` if the session doesn't belong
    ///   to this client's API key
    /// - `InvalidExpireTime` if the expiry isn't within the next 30 days
    /// - `ConnectionDataTooLong` if the connection data exceeds 1000 characters
    pub fn generate_token(
        &self,
        session_id: &str,
        options: &TokenOptions,
    ) -> Result<String, OpenTokError> {
        encode_token(
            &self.config.credentials,
            session_id,
            options,
            Utc::now().timestamp(),
            generate_nonce(),
        )
    }

    /// Create a new session. See [`SessionClient::create_session`].
    ///
    /// # Errors
    ///
    /// `RequestFailed`, `AuthFailed` or `PlatformError`.
    pub async fn create_session(
        &self,
        location: Option<&str>,
        properties: &SessionProperties,
    ) -> Result<Session, OpenTokError> {
        self.sessions.create_session(location, properties).await
    }

    /// Start recording a session. See [`ArchiveClient::start_archive`].
    ///
    /// # Errors
    ///
    /// `AuthFailed`, `InvalidSession`, `SessionNotFound`, `ArchiveError` or
    /// `RequestFailed`.
    pub async fn start_archive(
        &self,
        session_id: &str,
        name: Option<&str>,
    ) -> Result<Archive, OpenTokError> {
        self.archives.start_archive(session_id, name).await
    }

    /// Stop a started archive.
    ///
    /// # Errors
    ///
    /// `AuthFailed`, `ArchiveNotFound`, `ArchiveError` or `RequestFailed`.
    pub async fn stop_archive(&self, archive_id: &str) -> Result<Archive, OpenTokError> {
        self.archives.stop_archive(archive_id).await
    }

    /// Fetch an archive.
    ///
    /// # Errors
    ///
    /// `AuthFailed`, `ArchiveNotFound` or `RequestFailed`.
    pub async fn get_archive(&self, archive_id: &str) -> Result<Archive, OpenTokError> {
        self.archives.get_archive(archive_id).await
    }

    /// Fetch one page of archives.
    ///
    /// # Errors
    ///
    /// `AuthFailed`, `ArchiveNotFound` or `RequestFailed`.
    pub async fn list_archives(
        &self,
        offset: Option<u32>,
        count: Option<u32>,
    ) -> Result<ArchiveList, OpenTokError> {
        self.archives.list_archives(offset, count).await
    }

    /// Delete an archive.
    ///
    /// # Errors
    ///
    /// `AuthFailed`, `ArchiveNotFound` or `RequestFailed`.
    pub async fn delete_archive(&self, archive_id: &str) -> Result<(), OpenTokError> {
        self.archives.delete_archive(archive_id).await
    }
}

impl fmt::Debug for OpenTok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenTok")
            .field("api_key", &self.api_key())
            .field("api_url", &self.config.api_url)
            .finish_non_exhaustive()
    }
}
