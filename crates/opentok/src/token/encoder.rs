//! Token encoding.
//!
//! Wire format:
//!
//! ```text
//! "T1==" + base64("partner_id=<api_key>&sig=<hex hmac-sha1>:<canonical>")
//! ```
//!
//! where `<canonical>` is the form-urlencoded parameter string
//! `session_id, create_time, role, [expire_time], [connection_data], nonce`.
//! The canonical string is both transmitted and signed, so it must be
//! reproduced byte for byte inside the token.

use super::session_id::validate_session_id;
use super::{Role, TokenOptions};
use crate::config::{
    Credentials, MAX_CONNECTION_DATA_LEN, MAX_EXPIRE_WINDOW_SECS, TOKEN_SENTINEL,
};
use crate::crypto::sign_string;
use crate::errors::OpenTokError;
use crate::secret::ExposeSecret;
use base64::{engine::general_purpose, Engine as _};
use tracing::instrument;

/// Validated parameters of a single token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenParams<'a> {
    pub session_id: &'a str,
    pub create_time: i64,
    pub role: Role,
    pub expire_time: Option<i64>,
    pub connection_data: Option<&'a str>,
    pub nonce: u32,
}

/// Render the canonical parameter string.
///
/// Optional fields are omitted when unset. Values are encoded the way the
/// platform's reference SDKs encode them: space as `+`, everything but
/// ASCII alphanumerics and `-`, `.`, `_` percent-encoded.
pub fn canonical_string(params: &TokenParams<'_>) -> String {
    let create_time = params.create_time.to_string();
    let expire_time = params.expire_time.map(|t| t.to_string());
    let nonce = params.nonce.to_string();

    let mut pairs: Vec<(&str, &str)> = vec![
        ("session_id", params.session_id),
        ("create_time", &create_time),
        ("role", params.role.as_str()),
    ];
    if let Some(expire_time) = expire_time.as_deref() {
        pairs.push(("expire_time", expire_time));
    }
    if let Some(data) = params.connection_data {
        pairs.push(("connection_data", data));
    }
    pairs.push(("nonce", &nonce));

    pairs
        .into_iter()
        .map(|(key, value)| format!("{key}={}", encode_value(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Form-encode one value.
///
/// `form_urlencoded` leaves `*` literal; the signed format escapes it.
fn encode_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('*', "%2A")
}

/// Validate the inputs and produce a signed token.
///
/// `now` is the creation time in Unix seconds and `nonce` must already be in
/// range; [`OpenTok::generate_token`](crate::OpenTok::generate_token) supplies
/// the wall clock and a random nonce.
///
/// # Errors
///
/// Checked in order:
/// - `EmptySessionId` / `InvalidSessionId` from session ID validation
/// - `InvalidExpireTime` if the expiry is non-numeric, in the past, or more
///   than 30 days after `now`
/// - `ConnectionDataTooLong` if the data exceeds 1000 characters
#[instrument(skip_all)]
pub fn encode_token(
    credentials: &Credentials,
    session_id: &str,
    options: &TokenOptions,
    now: i64,
    nonce: u32,
) -> Result<String, OpenTokError> {
    validate_session_id(session_id, credentials.api_key())?;

    let role = options.role.unwrap_or_default();

    let expire_time = match &options.expire_time {
        Some(expire_time) => {
            let ts = expire_time.to_timestamp()?;
            if ts < now {
                return Err(OpenTokError::InvalidExpireTime(
                    "Expire time must be in the future".into(),
                ));
            }
            if ts > now + MAX_EXPIRE_WINDOW_SECS {
                return Err(OpenTokError::InvalidExpireTime(
                    "Expire time must be in the next 30 days".into(),
                ));
            }
            Some(ts)
        }
        None => None,
    };

    let connection_data = options.connection_data.as_deref();
    if let Some(data) = connection_data {
        let length = data.chars().count();
        if length > MAX_CONNECTION_DATA_LEN {
            return Err(OpenTokError::ConnectionDataTooLong { length });
        }
    }

    let params = TokenParams {
        session_id,
        create_time: now,
        role,
        expire_time,
        connection_data,
        nonce,
    };
    let canonical = canonical_string(&params);
    let sig = sign_string(&canonical, credentials.api_secret().expose_secret());

    let payload = format!(
        "partner_id={}&sig={}:{}",
        credentials.api_key(),
        sig,
        canonical
    );

    tracing::debug!(
        target: "opentok.token",
        role = %role,
        expire_time = ?expire_time,
        "Token generated"
    );

    Ok(format!(
        "{}{}",
        TOKEN_SENTINEL,
        general_purpose::STANDARD.encode(payload)
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::crypto::verify_signature;
    use crate::token::ExpireTime;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    const API_KEY: &str = "123456";
    const API_SECRET: &str = "1234567890abcdef1234567890abcdef1234567890";
    const NOW: i64 = 1_760_000_000;

    fn credentials() -> Credentials {
        Credentials::new(API_KEY, API_SECRET)
    }

    fn session_id() -> String {
        format!(
            "1_{}",
            URL_SAFE_NO_PAD.encode(format!("1~{API_KEY}~10.0.0.1~Wed Oct 15 2026~0.42~"))
        )
    }

    /// Decode a token into (partner_id, sig, canonical).
    fn decode(token: &str) -> (String, String, String) {
        let encoded = token.strip_prefix(TOKEN_SENTINEL).expect("sentinel");
        let raw = String::from_utf8(general_purpose::STANDARD.decode(encoded).unwrap()).unwrap();
        let (header, canonical) = raw.split_once(':').unwrap();
        let (partner, sig) = header.split_once("&sig=").unwrap();
        (
            partner.trim_start_matches("partner_id=").to_string(),
            sig.to_string(),
            canonical.to_string(),
        )
    }

    #[test]
    fn test_canonical_string_field_order() {
        let params = TokenParams {
            session_id: "1_abc",
            create_time: NOW,
            role: Role::Moderator,
            expire_time: Some(NOW + 60),
            connection_data: Some("name=Alice Smith&id=7"),
            nonce: 42,
        };

        assert_eq!(
            canonical_string(&params),
            "session_id=1_abc&create_time=1760000000&role=moderator\
             &expire_time=1760000060&connection_data=name%3DAlice+Smith%26id%3D7&nonce=42"
        );
    }

    #[test]
    fn test_canonical_string_reserved_characters() {
        let params = TokenParams {
            session_id: "1_abc",
            create_time: NOW,
            role: Role::Publisher,
            expire_time: None,
            connection_data: Some("a*b~c d/e-f.g_h"),
            nonce: 5,
        };

        assert_eq!(
            canonical_string(&params),
            "session_id=1_abc&create_time=1760000000&role=publisher\
             &connection_data=a%2Ab%7Ec+d%2Fe-f.g_h&nonce=5"
        );
    }

    #[test]
    fn test_canonical_string_omits_unset_fields() {
        let params = TokenParams {
            session_id: "1_abc",
            create_time: NOW,
            role: Role::Publisher,
            expire_time: None,
            connection_data: None,
            nonce: 0,
        };

        assert_eq!(
            canonical_string(&params),
            "session_id=1_abc&create_time=1760000000&role=publisher&nonce=0"
        );
    }

    #[test]
    fn test_token_round_trip() {
        let options = TokenOptions::new()
            .with_role(Role::Subscriber)
            .with_expire_time(NOW + 3600)
            .with_connection_data("user:carol / team #2");

        let sid = session_id();
        let token = encode_token(&credentials(), &sid, &options, NOW, 31337).unwrap();
        assert!(token.starts_with("T1=="));

        let (partner_id, sig, canonical) = decode(&token);
        assert_eq!(partner_id, API_KEY);
        assert!(verify_signature(&canonical, API_SECRET, &sig));
        assert_eq!(sign_string(&canonical, API_SECRET), sig);

        let params = TokenParams {
            session_id: &sid,
            create_time: NOW,
            role: Role::Subscriber,
            expire_time: Some(NOW + 3600),
            connection_data: Some("user:carol / team #2"),
            nonce: 31337,
        };
        assert_eq!(canonical, canonical_string(&params));
    }

    #[test]
    fn test_default_role_is_publisher() {
        let token =
            encode_token(&credentials(), &session_id(), &TokenOptions::new(), NOW, 1).unwrap();
        let (_, _, canonical) = decode(&token);
        assert!(canonical.contains("&role=publisher&"));
        assert!(!canonical.contains("expire_time"));
        assert!(!canonical.contains("connection_data"));
    }

    #[test]
    fn test_secret_is_trimmed_before_signing() {
        let padded = Credentials::new(API_KEY, format!("  {API_SECRET}\n"));
        let a = encode_token(&padded, &session_id(), &TokenOptions::new(), NOW, 7).unwrap();
        let b = encode_token(&credentials(), &session_id(), &TokenOptions::new(), NOW, 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_session_id() {
        let result = encode_token(&credentials(), "", &TokenOptions::new(), NOW, 1);
        assert!(matches!(result, Err(OpenTokError::EmptySessionId)));
    }

    #[test]
    fn test_session_of_other_partner() {
        let foreign = format!("1_{}", URL_SAFE_NO_PAD.encode("1~999999~10.0.0.1~"));
        let result = encode_token(&credentials(), &foreign, &TokenOptions::new(), NOW, 1);
        assert!(matches!(result, Err(OpenTokError::InvalidSessionId)));
    }

    #[test]
    fn test_expire_time_in_past() {
        let options = TokenOptions::new().with_expire_time(NOW - 1);
        let result = encode_token(&credentials(), &session_id(), &options, NOW, 1);
        assert!(matches!(result, Err(OpenTokError::InvalidExpireTime(_))));
    }

    #[test]
    fn test_expire_time_now_is_accepted() {
        let options = TokenOptions::new().with_expire_time(NOW);
        assert!(encode_token(&credentials(), &session_id(), &options, NOW, 1).is_ok());
    }

    #[test]
    fn test_expire_time_upper_bound_is_inclusive() {
        let options = TokenOptions::new().with_expire_time(NOW + MAX_EXPIRE_WINDOW_SECS);
        assert!(encode_token(&credentials(), &session_id(), &options, NOW, 1).is_ok());

        let options = TokenOptions::new().with_expire_time(NOW + MAX_EXPIRE_WINDOW_SECS + 1);
        let result = encode_token(&credentials(), &session_id(), &options, NOW, 1);
        assert!(
            matches!(result, Err(OpenTokError::InvalidExpireTime(ref m)) if m.contains("30 days"))
        );
    }

    #[test]
    fn test_expire_time_text() {
        let options = TokenOptions::new().with_expire_time((NOW + 10).to_string());
        let token = encode_token(&credentials(), &session_id(), &options, NOW, 1).unwrap();
        let (_, _, canonical) = decode(&token);
        assert!(canonical.contains("&expire_time=1760000010&"));

        let options = TokenOptions {
            expire_time: Some(ExpireTime::Text("next week".to_string())),
            ..TokenOptions::default()
        };
        let result = encode_token(&credentials(), &session_id(), &options, NOW, 1);
        assert!(
            matches!(result, Err(OpenTokError::InvalidExpireTime(ref m)) if m.contains("number"))
        );
    }

    #[test]
    fn test_connection_data_length_limit() {
        let options = TokenOptions::new().with_connection_data("a".repeat(1000));
        assert!(encode_token(&credentials(), &session_id(), &options, NOW, 1).is_ok());

        let options = TokenOptions::new().with_connection_data("a".repeat(1001));
        let result = encode_token(&credentials(), &session_id(), &options, NOW, 1);
        assert!(matches!(
            result,
            Err(OpenTokError::ConnectionDataTooLong { length: 1001 })
        ));
    }

    #[test]
    fn test_connection_data_counts_characters_not_bytes() {
        // 1000 two-byte characters is still within the limit
        let options = TokenOptions::new().with_connection_data("\u{e9}".repeat(1000));
        assert!(encode_token(&credentials(), &session_id(), &options, NOW, 1).is_ok());
    }

    #[test]
    fn test_expiry_checked_before_connection_data() {
        let options = TokenOptions::new()
            .with_expire_time(NOW - 100)
            .with_connection_data("a".repeat(5000));
        let result = encode_token(&credentials(), &session_id(), &options, NOW, 1);
        assert!(matches!(result, Err(OpenTokError::InvalidExpireTime(_))));
    }

    #[test]
    fn test_nonce_changes_token() {
        let a = encode_token(&credentials(), &session_id(), &TokenOptions::new(), NOW, 1).unwrap();
        let b = encode_token(&credentials(), &session_id(), &TokenOptions::new(), NOW, 2).unwrap();
        assert_ne!(a, b);
    }
}
