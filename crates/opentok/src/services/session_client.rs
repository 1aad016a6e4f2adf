//! Session creation client.
//!
//! Posts a form-encoded request to `/session/create` and turns the session
//! descriptor in the response into a [`Session`].

use super::descriptor::{parser_for, DescriptorError};
use super::transport::{HttpRequest, Method, Transport};
use super::with_partner_auth;
use crate::config::OpenTokConfig;
use crate::errors::OpenTokError;
use crate::models::{Session, SessionProperties};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// HTTP client for the session creation endpoint.
#[derive(Clone)]
pub struct SessionClient {
    config: Arc<OpenTokConfig>,
    transport: Arc<dyn Transport>,
}

impl SessionClient {
    pub fn new(config: Arc<OpenTokConfig>, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Create a new session.
    ///
    /// # Arguments
    ///
    /// * `location` - IP address hint used to pick a data center (sent as an
    ///   empty string when unset)
    /// * `properties` - optional platform settings, passed through opaquely
    ///
    /// # Errors
    ///
    /// - `OpenTokError::RequestFailed` on transport failure, an empty body, or
    ///   a body that is not a well-formed descriptor
    /// - `OpenTokError::AuthFailed` on HTTP 403 or an error descriptor
    /// - `OpenTokError::PlatformError` if the descriptor has no session ID
    #[instrument(skip_all, fields(location = ?location))]
    pub async fn create_session(
        &self,
        location: Option<&str>,
        properties: &SessionProperties,
    ) -> Result<Session, OpenTokError> {
        let credentials = &self.config.credentials;

        let mut form = url::form_urlencoded::Serializer::new(String::new());
        form.append_pair("api_key", credentials.api_key())
            .append_pair("location", location.unwrap_or_default());
        for (key, value) in properties.form_pairs() {
            form.append_pair(&key, &value);
        }

        let request = with_partner_auth(
            HttpRequest::new(Method::Post, self.config.session_url()),
            credentials,
        )
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(form.finish());

        let response = self.transport.request(request).await.map_err(|e| {
            warn!(target: "opentok.session", error = %e, "Session request failed");
            OpenTokError::request_failed(None, format!("Failed to create session: {e}"))
        })?;

        if response.status == 403 {
            warn!(target: "opentok.session", "Session creation rejected, invalid credentials");
            return Err(OpenTokError::auth_failed(
                "Failed to create session, invalid credentials",
            ));
        }

        if response.body.trim().is_empty() {
            warn!(target: "opentok.session", status = response.status, "Empty session response");
            return Err(OpenTokError::request_failed(
                Some(response.status),
                "Failed to create session: empty response",
            ));
        }

        let descriptor = parser_for(&response.body)
            .parse(&response.body)
            .map_err(|e| match e {
                DescriptorError::Platform { code, message } => {
                    warn!(target: "opentok.session", code = %code, "Platform rejected session creation");
                    OpenTokError::AuthFailed {
                        message: format!("Failed to create session (code={code}): {message}"),
                        code: Some(code),
                    }
                }
                DescriptorError::Syntax(reason) => {
                    warn!(target: "opentok.session", status = response.status, reason = %reason, "Unparsable session response");
                    OpenTokError::request_failed(
                        Some(response.status),
                        format!("Failed to create session: {reason}"),
                    )
                }
                DescriptorError::MissingSessionId(reason) => {
                    OpenTokError::PlatformError(format!("Failed to generate session: {reason}"))
                }
            })?;

        debug!(target: "opentok.session", "Session created");

        Ok(Session {
            session_id: descriptor.session_id,
            location: location.map(str::to_string),
            properties: properties.clone(),
        })
    }
}
