//! Data models for sessions and archives.
//!
//! Every model here is a passive snapshot of server state. Operations that
//! change remote state go through the [`OpenTok`] client and hand back a new
//! snapshot; nothing in this module mutates itself in place.

use crate::client::OpenTok;
use crate::errors::OpenTokError;
use crate::token::TokenOptions;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Sessions
// ============================================================================

/// Optional settings sent with a session creation request.
///
/// Unset fields are not sent. Keys the SDK doesn't model can be passed
/// through with [`SessionProperties::with_property`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionProperties {
    /// `echoSuppression.enabled`
    pub echo_suppression_enabled: Option<bool>,
    /// `multiplexer.numOutputStreams`
    pub multiplexer_num_output_streams: Option<u32>,
    /// `multiplexer.switchType`
    pub multiplexer_switch_type: Option<u32>,
    /// `multiplexer.switchTimeout` (milliseconds)
    pub multiplexer_switch_timeout: Option<u32>,
    /// `p2p.preference` ("enabled" relays media peer to peer)
    pub p2p_preference: Option<String>,
    /// Additional platform options, sent verbatim.
    pub extra: BTreeMap<String, String>,
}

impl SessionProperties {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_echo_suppression(mut self, enabled: bool) -> Self {
        self.echo_suppression_enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_multiplexer_num_output_streams(mut self, streams: u32) -> Self {
        self.multiplexer_num_output_streams = Some(streams);
        self
    }

    #[must_use]
    pub fn with_multiplexer_switch_type(mut self, switch_type: u32) -> Self {
        self.multiplexer_switch_type = Some(switch_type);
        self
    }

    #[must_use]
    pub fn with_multiplexer_switch_timeout(mut self, timeout_ms: u32) -> Self {
        self.multiplexer_switch_timeout = Some(timeout_ms);
        self
    }

    #[must_use]
    pub fn with_p2p_preference(mut self, preference: impl Into<String>) -> Self {
        self.p2p_preference = Some(preference.into());
        self
    }

    /// Pass an arbitrary option through to the platform.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Form fields for the set properties, modelled ones first.
    pub fn form_pairs(&self) -> Vec<(String, String)> {
        let modelled = [
            (
                "echoSuppression.enabled",
                self.echo_suppression_enabled.map(|v| v.to_string()),
            ),
            (
                "multiplexer.numOutputStreams",
                self.multiplexer_num_output_streams.map(|v| v.to_string()),
            ),
            (
                "multiplexer.switchType",
                self.multiplexer_switch_type.map(|v| v.to_string()),
            ),
            (
                "multiplexer.switchTimeout",
                self.multiplexer_switch_timeout.map(|v| v.to_string()),
            ),
            ("p2p.preference", self.p2p_preference.clone()),
        ];

        modelled
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
            .chain(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect()
    }
}

/// A session created on the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub session_id: String,

    /// Location hint the session was created with.
    pub location: Option<String>,

    /// Properties the session was created with.
    pub properties: SessionProperties,
}

impl Session {
    /// Wrap an existing session ID.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            location: None,
            properties: SessionProperties::default(),
        }
    }

    /// Generate a token for this session.
    ///
    /// # Errors
    ///
    /// See [`OpenTok::generate_token`].
    pub fn generate_token(
        &self,
        client: &OpenTok,
        options: &TokenOptions,
    ) -> Result<String, OpenTokError> {
        client.generate_token(&self.session_id, options)
    }
}

// ============================================================================
// Archives
// ============================================================================

/// Archive lifecycle status as reported by the platform.
///
/// The set of statuses is owned by the platform; unknown values are kept
/// verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ArchiveStatus {
    Started,
    Paused,
    Stopped,
    Uploaded,
    Available,
    Expired,
    Deleted,
    Failed,
    Other(String),
}

impl ArchiveStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ArchiveStatus::Started => "started",
            ArchiveStatus::Paused => "paused",
            ArchiveStatus::Stopped => "stopped",
            ArchiveStatus::Uploaded => "uploaded",
            ArchiveStatus::Available => "available",
            ArchiveStatus::Expired => "expired",
            ArchiveStatus::Deleted => "deleted",
            ArchiveStatus::Failed => "failed",
            ArchiveStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for ArchiveStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "started" => ArchiveStatus::Started,
            "paused" => ArchiveStatus::Paused,
            "stopped" => ArchiveStatus::Stopped,
            "uploaded" => ArchiveStatus::Uploaded,
            "available" => ArchiveStatus::Available,
            "expired" => ArchiveStatus::Expired,
            "deleted" => ArchiveStatus::Deleted,
            "failed" => ArchiveStatus::Failed,
            _ => ArchiveStatus::Other(raw),
        }
    }
}

impl From<ArchiveStatus> for String {
    fn from(status: ArchiveStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ArchiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of an archive (a server-side recording of a session).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Archive {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    pub status: ArchiveStatus,

    pub session_id: String,

    /// API key of the owning partner (sent as a number by the platform).
    #[serde(deserialize_with = "string_or_number")]
    pub partner_id: String,

    /// Creation time (epoch milliseconds on the wire).
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    /// Size in bytes, 0 until the recording is available.
    #[serde(default)]
    pub size: u64,

    /// Duration in seconds.
    #[serde(default)]
    pub duration: u64,

    /// Download URL, present once the archive is available.
    #[serde(default)]
    pub url: Option<String>,
}

impl Archive {
    /// Stop this archive, returning the server's updated snapshot.
    ///
    /// # Errors
    ///
    /// See [`OpenTok::stop_archive`].
    pub async fn stop(&self, client: &OpenTok) -> Result<Archive, OpenTokError> {
        client.stop_archive(&self.id).await
    }

    /// Delete this archive.
    ///
    /// # Errors
    ///
    /// See [`OpenTok::delete_archive`].
    pub async fn delete(&self, client: &OpenTok) -> Result<(), OpenTokError> {
        client.delete_archive(&self.id).await
    }

    /// Pretty-printed JSON rendering of the snapshot.
    pub fn to_json(&self) -> Result<String, OpenTokError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| OpenTokError::PlatformError(format!("Failed to render archive: {e}")))
    }
}

/// One page of archives, in the order the platform returned them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveList {
    /// Total number of archives for the partner (not just this page).
    pub count: u64,

    #[serde(default)]
    pub items: Vec<Archive>,
}

impl ArchiveList {
    pub fn iter(&self) -> std::slice::Iter<'_, Archive> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn to_json(&self) -> Result<String, OpenTokError> {
        serde_json::to_string_pretty(self).map_err(|e| {
            OpenTokError::PlatformError(format!("Failed to render archive list: {e}"))
        })
    }
}

impl<'a> IntoIterator for &'a ArchiveList {
    type Item = &'a Archive;
    type IntoIter = std::slice::Iter<'a, Archive>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for ArchiveList {
    type Item = Archive;
    type IntoIter = std::vec::IntoIter<Archive>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(serde_json::Number),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn archive_json() -> serde_json::Value {
        serde_json::json!({
            "createdAt": 1384221730555_i64,
            "duration": 328,
            "id": "b40ef09b-3811-4726-b508-e41a0f96c68f",
            "name": "The archive name you supplied",
            "partnerId": 234567,
            "reason": "",
            "sessionId": "flR1ZSBPY3QgMjkgMTI6MTM6MjMgUERUIDIwMTN",
            "size": 18023312,
            "status": "available",
            "url": "https://tokbox.com.archive2.s3.amazonaws.com/234567/b40ef09b/archive.mp4"
        })
    }

    #[test]
    fn test_archive_deserialization() {
        let archive: Archive = serde_json::from_value(archive_json()).unwrap();

        assert_eq!(archive.id, "b40ef09b-3811-4726-b508-e41a0f96c68f");
        assert_eq!(archive.name.as_deref(), Some("The archive name you supplied"));
        assert_eq!(archive.status, ArchiveStatus::Available);
        assert_eq!(archive.session_id, "flR1ZSBPY3QgMjkgMTI6MTM6MjMgUERUIDIwMTN");
        assert_eq!(archive.partner_id, "234567");
        assert_eq!(
            archive.created_at,
            Utc.timestamp_millis_opt(1_384_221_730_555).unwrap()
        );
        assert_eq!(archive.size, 18_023_312);
        assert_eq!(archive.duration, 328);
        assert!(archive.url.unwrap().ends_with("archive.mp4"));
    }

    #[test]
    fn test_archive_started_has_no_url() {
        let archive: Archive = serde_json::from_value(serde_json::json!({
            "createdAt": 1384221730555_i64,
            "duration": 0,
            "id": "abc",
            "name": null,
            "partnerId": "234567",
            "sessionId": "sess",
            "size": 0,
            "status": "started",
            "url": null
        }))
        .unwrap();

        assert_eq!(archive.status, ArchiveStatus::Started);
        assert_eq!(archive.partner_id, "234567");
        assert!(archive.name.is_none());
        assert!(archive.url.is_none());
    }

    #[test]
    fn test_archive_status_unknown_value_is_preserved() {
        let status: ArchiveStatus = serde_json::from_str("\"transcoding\"").unwrap();
        assert_eq!(status, ArchiveStatus::Other("transcoding".to_string()));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"transcoding\"");
    }

    #[test]
    fn test_archive_status_round_trip_known_values() {
        for raw in [
            "started", "paused", "stopped", "uploaded", "available", "expired", "deleted",
            "failed",
        ] {
            let status = ArchiveStatus::from(raw.to_string());
            assert!(!matches!(status, ArchiveStatus::Other(_)), "{raw}");
            assert_eq!(status.to_string(), raw);
        }
    }

    #[test]
    fn test_archive_to_json() {
        let archive: Archive = serde_json::from_value(archive_json()).unwrap();
        let json = archive.to_json().unwrap();
        assert!(json.contains("\"sessionId\""));
        assert!(json.contains("\"createdAt\": 1384221730555"));
        assert!(json.contains("\"status\": \"available\""));
    }

    #[test]
    fn test_archive_list_preserves_order() {
        let mut first = archive_json();
        first["id"] = serde_json::json!("first");
        let mut second = archive_json();
        second["id"] = serde_json::json!("second");

        let list: ArchiveList = serde_json::from_value(serde_json::json!({
            "count": 2,
            "items": [first, second]
        }))
        .unwrap();

        assert_eq!(list.count, 2);
        assert_eq!(list.len(), 2);
        let ids: Vec<_> = list.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);

        let owned: Vec<_> = list.into_iter().map(|a| a.id).collect();
        assert_eq!(owned, vec!["first", "second"]);
    }

    #[test]
    fn test_archive_list_missing_items() {
        let list: ArchiveList = serde_json::from_str(r#"{"count": 0}"#).unwrap();
        assert!(list.is_empty());
        assert!(list.to_json().unwrap().contains("\"count\": 0"));
    }

    #[test]
    fn test_session_properties_only_set_values() {
        assert!(SessionProperties::new().form_pairs().is_empty());

        let pairs = SessionProperties::new()
            .with_echo_suppression(true)
            .with_multiplexer_num_output_streams(4)
            .with_p2p_preference("enabled")
            .with_property("custom.flag", "on")
            .form_pairs();

        assert_eq!(
            pairs,
            vec![
                ("echoSuppression.enabled".to_string(), "true".to_string()),
                ("multiplexer.numOutputStreams".to_string(), "4".to_string()),
                ("p2p.preference".to_string(), "enabled".to_string()),
                ("custom.flag".to_string(), "on".to_string()),
            ]
        );
    }

    #[test]
    fn test_session_properties_switch_settings() {
        let pairs = SessionProperties::new()
            .with_multiplexer_switch_type(1)
            .with_multiplexer_switch_timeout(3000)
            .form_pairs();

        assert_eq!(
            pairs,
            vec![
                ("multiplexer.switchType".to_string(), "1".to_string()),
                ("multiplexer.switchTimeout".to_string(), "3000".to_string()),
            ]
        );
    }

    #[test]
    fn test_session_new() {
        let session = Session::new("1_abc");
        assert_eq!(session.session_id, "1_abc");
        assert!(session.location.is_none());
        assert_eq!(session.properties, SessionProperties::default());
    }
}
