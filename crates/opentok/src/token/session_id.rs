//! Session ID validation.
//!
//! A session ID is a two-character version prefix followed by an unpadded
//! base64url payload of `~`-separated fields. The second field is the API key
//! of the partner that owns the session; tokens may only be minted for
//! sessions owned by the signing partner.

use crate::errors::OpenTokError;
use base64::{
    alphabet,
    engine::{GeneralPurpose, GeneralPurposeConfig},
    Engine,
};

/// Length of the version prefix preceding the encoded payload.
const SESSION_ID_PREFIX_LEN: usize = 2;

/// Field separator inside the decoded payload.
const FIELD_SEPARATOR: u8 = b'~';

/// Padding lengths tried, in order, when decoding the payload.
const PADDING_ATTEMPTS: [usize; 3] = [0, 1, 2];

/// Standard alphabet, canonical padding, lenient about trailing bits.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Check that `session_id` belongs to the partner identified by `api_key`.
///
/// # Errors
///
/// - `OpenTokError::EmptySessionId` if `session_id` is empty
/// - `OpenTokError::InvalidSessionId` if the payload cannot be decoded, has
///   no second field, or names a different API key
pub fn validate_session_id(session_id: &str, api_key: &str) -> Result<(), OpenTokError> {
    if session_id.is_empty() {
        return Err(OpenTokError::EmptySessionId);
    }

    let decoded = decode_payload(session_id).ok_or_else(|| {
        tracing::debug!(target: "opentok.token", "Session ID payload could not be decoded");
        OpenTokError::InvalidSessionId
    })?;

    match decoded.split(|b| *b == FIELD_SEPARATOR).nth(1) {
        Some(owner) if owner == api_key.as_bytes() => Ok(()),
        _ => {
            tracing::debug!(target: "opentok.token", "Session ID does not belong to this API key");
            Err(OpenTokError::InvalidSessionId)
        }
    }
}

/// Decode the payload after the prefix.
///
/// Returns the first padding candidate that decodes and contains a field
/// separator. Only 0, 1 and 2 padding characters are attempted.
fn decode_payload(session_id: &str) -> Option<Vec<u8>> {
    let payload = session_id
        .get(SESSION_ID_PREFIX_LEN..)?
        .replace('-', "+")
        .replace('_', "/");

    PADDING_ATTEMPTS.iter().find_map(|&padding| {
        let candidate = format!("{payload}{}", "=".repeat(padding));
        PAYLOAD_ENGINE
            .decode(candidate)
            .ok()
            .filter(|bytes| bytes.contains(&FIELD_SEPARATOR))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    fn session_id_for(api_key: &str) -> String {
        let payload = format!("1~{api_key}~127.0.0.1~Tue Oct 14 09:12:44 PDT 2026~0.3047~");
        format!("1_{}", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn test_valid_session_id() {
        let session_id = session_id_for("123456");
        assert!(validate_session_id(&session_id, "123456").is_ok());
    }

    #[test]
    fn test_every_padding_length_is_handled() {
        // Payload lengths 0, 1 and 2 mod 3 need 0, 2 and 1 padding characters
        for api_key in ["1234", "12345", "123456"] {
            for tail in ["", "x", "xy"] {
                let payload = format!("1~{api_key}~{tail}");
                let session_id = format!("2_{}", URL_SAFE_NO_PAD.encode(payload));
                assert!(
                    validate_session_id(&session_id, api_key).is_ok(),
                    "failed for key {api_key} tail {tail:?}"
                );
            }
        }
    }

    #[test]
    fn test_url_safe_characters_are_translated() {
        // Bytes chosen so the base64 output contains '+' and '/' (→ '-' and '_')
        let mut payload = b"1~123456~".to_vec();
        payload.extend_from_slice(&[0xfb, 0xff, 0xbf, 0xfe]);
        let session_id = format!("1_{}", URL_SAFE_NO_PAD.encode(&payload));
        assert!(session_id.contains('-') || session_id.contains('_'));

        assert!(validate_session_id(&session_id, "123456").is_ok());
    }

    #[test]
    fn test_empty_session_id() {
        let result = validate_session_id("", "123456");
        assert!(matches!(result, Err(OpenTokError::EmptySessionId)));
    }

    #[test]
    fn test_wrong_api_key() {
        let session_id = session_id_for("123456");
        let result = validate_session_id(&session_id, "654321");
        assert!(matches!(result, Err(OpenTokError::InvalidSessionId)));
    }

    #[test]
    fn test_api_key_prefix_is_not_enough() {
        let session_id = session_id_for("1234567");
        let result = validate_session_id(&session_id, "123456");
        assert!(matches!(result, Err(OpenTokError::InvalidSessionId)));
    }

    #[test]
    fn test_garbage_payload() {
        for session_id in ["1_!!!not-base64!!!", "1_", "x", "1_ab", "\u{e9}\u{e9}"] {
            let result = validate_session_id(session_id, "123456");
            assert!(
                matches!(result, Err(OpenTokError::InvalidSessionId)),
                "expected InvalidSessionId for {session_id:?}"
            );
        }
    }

    #[test]
    fn test_payload_without_separator() {
        let session_id = format!("1_{}", URL_SAFE_NO_PAD.encode("no separators here"));
        let result = validate_session_id(&session_id, "123456");
        assert!(matches!(result, Err(OpenTokError::InvalidSessionId)));
    }

    #[test]
    fn test_payload_with_single_field() {
        // Separator present but nothing after it
        let session_id = format!("1_{}", URL_SAFE_NO_PAD.encode("1~"));
        let result = validate_session_id(&session_id, "123456");
        assert!(matches!(result, Err(OpenTokError::InvalidSessionId)));
    }

    #[test]
    fn test_padding_beyond_two_is_not_attempted() {
        // A single trailing base64 character can never be completed by padding
        let session_id = format!("1_{}A", URL_SAFE_NO_PAD.encode("1~123456~xyz"));
        let result = validate_session_id(&session_id, "123456");
        assert!(matches!(result, Err(OpenTokError::InvalidSessionId)));
    }
}
