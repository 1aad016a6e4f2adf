//! Session ID fixtures and session creation response bodies.
//!
//! A session ID is a two-character prefix followed by base64 whose decoded
//! text is `~`-separated with the partner's API key in the second field.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// A session ID embedding `api_key`.
pub fn test_session_id(api_key: &str) -> String {
    session_id_with_payload(&format!("1~{api_key}~Mon Mar 17 00:41:31 PDT 2014~0.6849~"))
}

/// A session ID embedding `api_key` whose base64 payload has had its `=`
/// padding stripped, as the platform issues them.
///
/// `tail` varies the payload length so tests can hit each padding case.
pub fn test_session_id_unpadded(api_key: &str, tail: &str) -> String {
    let encoded = STANDARD.encode(format!("1~{api_key}~Mon Mar 17~{tail}"));
    format!("1_{}", encoded.trim_end_matches('='))
}

/// A session ID with an arbitrary decoded payload.
pub fn session_id_with_payload(payload: &str) -> String {
    format!("1_{}", STANDARD.encode(payload))
}

/// Legacy XML body returned by a successful session creation.
pub fn session_xml(session_id: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><sessions><Session><session_id>{session_id}</session_id><partner_id>123456</partner_id><create_dt>Mon Mar 17 00:41:31 PDT 2014</create_dt></Session></sessions>"#
    )
}

/// JSON body returned by a successful session creation.
pub fn session_json(session_id: &str) -> String {
    serde_json::json!([{
        "session_id": session_id,
        "project_id": "123456",
        "partner_id": "123456",
        "create_dt": "Mon Mar 17 00:41:31 PDT 2014",
        "media_server_url": ""
    }])
    .to_string()
}

/// Legacy XML error body.
pub fn session_error_xml(code: &str, message: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Errors><error code="{code}"><notLoggedIn message="{message}"/></error></Errors>"#
    )
}
