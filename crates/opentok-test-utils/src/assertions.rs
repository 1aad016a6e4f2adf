//! Custom test assertions for expressive tests
//!
//! Provides trait-based assertions for `T1==` tokens. Tokens are decoded and
//! their signatures checked here independently of the SDK.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ring::hmac;

const TOKEN_SENTINEL: &str = "T1==";

/// A token split into its parts.
#[derive(Debug, Clone)]
pub struct DecodedToken {
    pub partner_id: String,
    pub signature: String,
    /// The signed, form-encoded parameter string.
    pub canonical: String,
    /// `canonical` decoded into ordered key/value pairs.
    pub params: Vec<(String, String)>,
}

impl DecodedToken {
    /// Value of a token parameter, if present.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Parameter names in order.
    pub fn keys(&self) -> Vec<&str> {
        self.params.iter().map(|(k, _)| k.as_str()).collect()
    }
}

/// Decode a token, panicking with a descriptive message if it is malformed.
pub fn decode_token(token: &str) -> DecodedToken {
    let payload = token
        .strip_prefix(TOKEN_SENTINEL)
        .unwrap_or_else(|| panic!("Token must start with {TOKEN_SENTINEL}, got {token}"));

    let decoded = STANDARD
        .decode(payload)
        .unwrap_or_else(|e| panic!("Token payload is not base64: {e}"));
    let decoded = String::from_utf8(decoded).expect("Token payload must be UTF-8");

    let (meta, canonical) = decoded
        .split_once(':')
        .expect("Token payload must contain ':' separating metadata and parameters");

    let meta: Vec<(String, String)> = url::form_urlencoded::parse(meta.as_bytes())
        .into_owned()
        .collect();
    let meta_value = |key: &str| {
        meta.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| panic!("Token metadata missing {key}"))
    };

    DecodedToken {
        partner_id: meta_value("partner_id"),
        signature: meta_value("sig"),
        canonical: canonical.to_string(),
        params: url::form_urlencoded::parse(canonical.as_bytes())
            .into_owned()
            .collect(),
    }
}

/// Custom assertions for generated tokens
///
/// # Example
/// ```rust,ignore
/// token
///     .assert_valid_token()
///     .assert_signed_with(TEST_API_SECRET)
///     .assert_role("moderator");
/// ```
pub trait TokenAssertions {
    /// Assert the token decodes and carries every required parameter in order
    fn assert_valid_token(&self) -> &Self;

    /// Assert the embedded signature is HMAC-SHA1 of the parameters under `secret`
    fn assert_signed_with(&self, secret: &str) -> &Self;

    /// Assert the token was issued to `api_key`
    fn assert_partner_id(&self, api_key: &str) -> &Self;

    /// Assert the token is for `session_id`
    fn assert_session_id(&self, session_id: &str) -> &Self;

    /// Assert the granted role
    fn assert_role(&self, role: &str) -> &Self;

    /// Assert the expiry timestamp, or its absence with `None`
    fn assert_expire_time(&self, expire_time: Option<i64>) -> &Self;

    /// Assert the connection data, or its absence with `None`
    fn assert_connection_data(&self, data: Option<&str>) -> &Self;
}

impl TokenAssertions for str {
    fn assert_valid_token(&self) -> &Self {
        let decoded = decode_token(self);
        let keys = decoded.keys();

        let required = ["session_id", "create_time", "role"];
        assert!(
            keys.len() >= 4 && keys.iter().take(3).eq(required.iter()),
            "Token parameters must start with {required:?}, got {keys:?}"
        );
        assert_eq!(keys.last(), Some(&"nonce"), "nonce must be the last parameter");

        let nonce: u32 = decoded
            .param("nonce")
            .and_then(|n| n.parse().ok())
            .expect("nonce must be an integer");
        assert!(nonce <= 999_999, "nonce out of range: {nonce}");

        let create_time: i64 = decoded
            .param("create_time")
            .and_then(|t| t.parse().ok())
            .expect("create_time must be an integer");
        let now = chrono::Utc::now().timestamp();
        assert!(
            (now - create_time).abs() < 300,
            "create_time {create_time} is not close to now ({now})"
        );

        assert_eq!(
            decoded.signature.len(),
            40,
            "Signature must be 40 hex characters"
        );
        self
    }

    fn assert_signed_with(&self, secret: &str) -> &Self {
        let decoded = decode_token(self);
        let signature = hex::decode(&decoded.signature).expect("Signature must be hex");
        let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, secret.as_bytes());
        assert!(
            hmac::verify(&key, decoded.canonical.as_bytes(), &signature).is_ok(),
            "Token signature does not match the parameters under the given secret"
        );
        self
    }

    fn assert_partner_id(&self, api_key: &str) -> &Self {
        assert_eq!(decode_token(self).partner_id, api_key);
        self
    }

    fn assert_session_id(&self, session_id: &str) -> &Self {
        assert_eq!(decode_token(self).param("session_id"), Some(session_id));
        self
    }

    fn assert_role(&self, role: &str) -> &Self {
        assert_eq!(decode_token(self).param("role"), Some(role));
        self
    }

    fn assert_expire_time(&self, expire_time: Option<i64>) -> &Self {
        let decoded = decode_token(self);
        let actual = decoded
            .param("expire_time")
            .map(|t| t.parse::<i64>().expect("expire_time must be an integer"));
        assert_eq!(actual, expire_time);
        self
    }

    fn assert_connection_data(&self, data: Option<&str>) -> &Self {
        assert_eq!(decode_token(self).param("connection_data"), data);
        self
    }
}

impl TokenAssertions for String {
    fn assert_valid_token(&self) -> &Self {
        self.as_str().assert_valid_token();
        self
    }

    fn assert_signed_with(&self, secret: &str) -> &Self {
        self.as_str().assert_signed_with(secret);
        self
    }

    fn assert_partner_id(&self, api_key: &str) -> &Self {
        self.as_str().assert_partner_id(api_key);
        self
    }

    fn assert_session_id(&self, session_id: &str) -> &Self {
        self.as_str().assert_session_id(session_id);
        self
    }

    fn assert_role(&self, role: &str) -> &Self {
        self.as_str().assert_role(role);
        self
    }

    fn assert_expire_time(&self, expire_time: Option<i64>) -> &Self {
        self.as_str().assert_expire_time(expire_time);
        self
    }

    fn assert_connection_data(&self, data: Option<&str>) -> &Self {
        self.as_str().assert_connection_data(data);
        self
    }
}
