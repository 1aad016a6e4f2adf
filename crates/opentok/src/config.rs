//! Client configuration and partner credentials.
//!
//! Fixed protocol values (token sentinel, default endpoint, validation limits)
//! live here as named constants rather than module-level state.

use crate::secret::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Prefix identifying the token format version.
pub const TOKEN_SENTINEL: &str = "T1==";

/// Production REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.opentok.com";

/// Tokens may not expire more than 30 days after creation.
pub const MAX_EXPIRE_WINDOW_SECS: i64 = 2_592_000;

/// Maximum connection data length, in characters.
pub const MAX_CONNECTION_DATA_LEN: usize = 1000;

/// Upper bound (inclusive) of the per-token nonce.
pub const MAX_NONCE: u32 = 999_999;

/// Default HTTP request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default HTTP connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Value sent in the `User-Agent` header.
pub const USER_AGENT: &str = concat!("OpenTok-Rust-SDK/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },

    #[error("API URL must use HTTPS: {0}")]
    InsecureApiUrl(String),
}

/// Partner API key and secret.
///
/// The secret is trimmed of surrounding whitespace at construction and never
/// changes afterwards.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    api_secret: SecretString,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl AsRef<str>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: SecretString::from(api_secret.as_ref().trim()),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn api_secret(&self) -> &SecretString {
        &self.api_secret
    }

    /// Value of the `X-TB-PARTNER-AUTH` header.
    pub(crate) fn partner_auth(&self) -> String {
        format!("{}:{}", self.api_key, self.api_secret.expose_secret())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// Configuration for an [`OpenTok`](crate::OpenTok) client.
#[derive(Debug, Clone)]
pub struct OpenTokConfig {
    pub credentials: Credentials,

    /// Base URL of the REST API, without a trailing slash.
    pub api_url: String,

    pub request_timeout: Duration,

    pub connect_timeout: Duration,
}

impl OpenTokConfig {
    /// Create a configuration for the production endpoint with default timeouts.
    #[must_use]
    pub fn new(api_key: impl Into<String>, api_secret: impl AsRef<str>) -> Self {
        Self {
            credentials: Credentials::new(api_key, api_secret),
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Create a configuration pointed at `api_url`, requiring HTTPS.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InsecureApiUrl` if the URL doesn't use HTTPS.
    pub fn new_secure(
        api_key: impl Into<String>,
        api_secret: impl AsRef<str>,
        api_url: &str,
    ) -> Result<Self, ConfigError> {
        if !api_url.starts_with("https://") {
            return Err(ConfigError::InsecureApiUrl(api_url.to_string()));
        }
        Ok(Self::new(api_key, api_secret).with_api_url(api_url))
    }

    /// Override the REST endpoint (e.g. a staging environment or a mock server).
    #[must_use]
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    ///
    /// Reads `OPENTOK_API_KEY` and `OPENTOK_API_SECRET` (required), and
    /// `OPENTOK_API_URL` and `OPENTOK_REQUEST_TIMEOUT_SECS` (optional).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let api_key = vars
            .get("OPENTOK_API_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENTOK_API_KEY".to_string()))?;

        let api_secret = vars
            .get("OPENTOK_API_SECRET")
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENTOK_API_SECRET".to_string()))?;

        let mut config = Self::new(api_key.clone(), api_secret);

        if let Some(api_url) = vars.get("OPENTOK_API_URL") {
            config = config.with_api_url(api_url);
        }

        if let Some(raw) = vars.get("OPENTOK_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|e| ConfigError::InvalidValue {
                name: "OPENTOK_REQUEST_TIMEOUT_SECS".to_string(),
                reason: format!("{e}"),
            })?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    name: "OPENTOK_REQUEST_TIMEOUT_SECS".to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
            config = config.with_request_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub(crate) fn session_url(&self) -> String {
        format!("{}/session/create", self.api_url)
    }

    pub(crate) fn archive_url(&self, archive_id: Option<&str>) -> String {
        let base = format!(
            "{}/v2/partner/{}/archive",
            self.api_url,
            self.credentials.api_key()
        );
        match archive_id {
            Some(id) => format!("{base}/{}", path_segment(id)),
            None => base,
        }
    }
}

/// Percent-encode a caller-supplied ID so it stays a single path segment.
fn path_segment(id: &str) -> String {
    url::form_urlencoded::byte_serialize(id.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn required_vars() -> HashMap<String, String> {
        HashMap::from([
            ("OPENTOK_API_KEY".to_string(), "123456".to_string()),
            ("OPENTOK_API_SECRET".to_string(), "secret".to_string()),
        ])
    }

    #[test]
    fn test_credentials_trim_secret() {
        let creds = Credentials::new("123456", "  padded-secret \n");
        assert_eq!(creds.api_secret().expose_secret(), "padded-secret");
        assert_eq!(creds.partner_auth(), "123456:padded-secret");
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = Credentials::new("123456", "super-secret-value");
        let debug_str = format!("{creds:?}");
        assert!(debug_str.contains("123456"));
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("super-secret-value"));
    }

    #[test]
    fn test_config_defaults() {
        let config = OpenTokConfig::new("123456", "secret");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }

    #[test]
    fn test_config_builder() {
        let config = OpenTokConfig::new("123456", "secret")
            .with_api_url("http://localhost:9000/")
            .with_request_timeout(Duration::from_secs(3))
            .with_connect_timeout(Duration::from_secs(1));

        assert_eq!(config.api_url, "http://localhost:9000");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_new_secure_rejects_http() {
        let result = OpenTokConfig::new_secure("123456", "secret", "http://api.opentok.com");
        assert!(matches!(result, Err(ConfigError::InsecureApiUrl(_))));

        let config =
            OpenTokConfig::new_secure("123456", "secret", "https://api.opentok.com").unwrap();
        assert_eq!(config.api_url, "https://api.opentok.com");
    }

    #[test]
    fn test_urls() {
        let config = OpenTokConfig::new("123456", "secret");
        assert_eq!(config.session_url(), "https://api.opentok.com/session/create");
        assert_eq!(
            config.archive_url(None),
            "https://api.opentok.com/v2/partner/123456/archive"
        );
        assert_eq!(
            config.archive_url(Some("abc-123")),
            "https://api.opentok.com/v2/partner/123456/archive/abc-123"
        );
    }

    #[test]
    fn test_archive_url_escapes_id() {
        let config = OpenTokConfig::new("123456", "secret");
        assert_eq!(
            config.archive_url(Some("../session/create?x=1#y")),
            "https://api.opentok.com/v2/partner/123456/archive/..%2Fsession%2Fcreate%3Fx%3D1%23y"
        );
        assert_eq!(
            config.archive_url(Some("a b+c")),
            "https://api.opentok.com/v2/partner/123456/archive/a%20b%2Bc"
        );
    }

    #[test]
    fn test_user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("OpenTok-Rust-SDK/"));
        assert!(USER_AGENT.ends_with(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_from_vars_success() {
        let mut vars = required_vars();
        vars.insert(
            "OPENTOK_API_URL".to_string(),
            "https://staging.opentok.com".to_string(),
        );
        vars.insert("OPENTOK_REQUEST_TIMEOUT_SECS".to_string(), "30".to_string());

        let config = OpenTokConfig::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.credentials.api_key(), "123456");
        assert_eq!(config.api_url, "https://staging.opentok.com");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_from_vars_defaults() {
        let config = OpenTokConfig::from_vars(&required_vars()).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_from_vars_missing_api_key() {
        let vars = HashMap::from([("OPENTOK_API_SECRET".to_string(), "secret".to_string())]);
        let result = OpenTokConfig::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "OPENTOK_API_KEY"));
    }

    #[test]
    fn test_from_vars_missing_api_secret() {
        let vars = HashMap::from([("OPENTOK_API_KEY".to_string(), "123456".to_string())]);
        let result = OpenTokConfig::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "OPENTOK_API_SECRET")
        );
    }

    #[test]
    fn test_from_vars_invalid_timeout() {
        let mut vars = required_vars();
        vars.insert(
            "OPENTOK_REQUEST_TIMEOUT_SECS".to_string(),
            "soon".to_string(),
        );
        let result = OpenTokConfig::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        vars.insert("OPENTOK_REQUEST_TIMEOUT_SECS".to_string(), "0".to_string());
        let result = OpenTokConfig::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidValue { reason, .. }) if reason.contains("greater than zero"))
        );
    }
}
