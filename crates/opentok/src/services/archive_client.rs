//! Archive lifecycle client.
//!
//! Archives are driven entirely server-side. This client only issues the
//! transitions (start, stop, delete) and reads back the platform's view of
//! an archive or a page of archives.
//!
//! Status mapping:
//!
//! | Operation | 403        | 400            | 404             | 409          |
//! |-----------|------------|----------------|-----------------|--------------|
//! | start     | AuthFailed | InvalidSession | SessionNotFound | ArchiveError |
//! | stop      | AuthFailed |                | ArchiveNotFound | ArchiveError |
//! | get       | AuthFailed |                | ArchiveNotFound |              |
//! | list      | AuthFailed |                | ArchiveNotFound |              |
//! | delete    | AuthFailed |                | ArchiveNotFound |              |
//!
//! Anything else at or above 300 is `RequestFailed` carrying the status.

use super::transport::{HttpRequest, HttpResponse, Method, Transport};
use super::with_partner_auth;
use crate::config::OpenTokConfig;
use crate::errors::OpenTokError;
use crate::models::{Archive, ArchiveList};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Body of a start request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartArchiveRequest<'a> {
    session_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveOperation {
    Start,
    Stop,
    Get,
    List,
    Delete,
}

impl ArchiveOperation {
    fn as_str(self) -> &'static str {
        match self {
            ArchiveOperation::Start => "start",
            ArchiveOperation::Stop => "stop",
            ArchiveOperation::Get => "get",
            ArchiveOperation::List => "list",
            ArchiveOperation::Delete => "delete",
        }
    }

    /// Map a non-success response to an error. `subject` is the session ID
    /// for `Start` and the archive ID otherwise.
    fn error_for(self, response: &HttpResponse, subject: &str) -> OpenTokError {
        match (self, response.status) {
            (_, 403) => OpenTokError::auth_failed("An invalid API key or secret was provided"),
            (ArchiveOperation::Start, 400) => {
                OpenTokError::InvalidSession(format!("Session ID {subject} is invalid"))
            }
            (ArchiveOperation::Start, 404) => OpenTokError::SessionNotFound(format!(
                "No clients are actively connected to session {subject}"
            )),
            (ArchiveOperation::Start, 409) => {
                OpenTokError::ArchiveError(platform_message(&response.body).unwrap_or_else(|| {
                    format!("Session {subject} is already being recorded or is not routed")
                }))
            }
            (ArchiveOperation::List, 404) => {
                OpenTokError::ArchiveNotFound("No archives found".to_string())
            }
            (_, 404) => OpenTokError::ArchiveNotFound(format!("Archive {subject} not found")),
            (ArchiveOperation::Stop, 409) => {
                OpenTokError::ArchiveError("Archive is not in started state".to_string())
            }
            (_, status) => OpenTokError::request_failed(
                Some(status),
                format!(
                    "Unexpected response to archive {}: HTTP {status}",
                    self.as_str()
                ),
            ),
        }
    }
}

/// The `message` field of a JSON error body, if there is one.
fn platform_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

/// HTTP client for the archive resource.
#[derive(Clone)]
pub struct ArchiveClient {
    config: Arc<OpenTokConfig>,
    transport: Arc<dyn Transport>,
}

impl ArchiveClient {
    pub fn new(config: Arc<OpenTokConfig>, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Start recording a session.
    ///
    /// # Errors
    ///
    /// - `AuthFailed` (403), `InvalidSession` (400), `SessionNotFound` (404)
    /// - `ArchiveError` (409) with the platform's message, typically because
    ///   the session is already being recorded
    /// - `RequestFailed` for anything else
    #[instrument(skip_all, fields(session_id = %session_id))]
    pub async fn start_archive(
        &self,
        session_id: &str,
        name: Option<&str>,
    ) -> Result<Archive, OpenTokError> {
        let payload = StartArchiveRequest { session_id, name };
        let body = serde_json::to_string(&payload).map_err(|e| {
            OpenTokError::request_failed(None, format!("Failed to encode archive request: {e}"))
        })?;

        let request = self
            .request(Method::Post, self.config.archive_url(None))
            .body(body);

        let response = self
            .send(ArchiveOperation::Start, request, session_id)
            .await?;
        let archive: Archive = parse_body(&response)?;

        debug!(target: "opentok.archive", archive_id = %archive.id, "Archive started");
        Ok(archive)
    }

    /// Stop a started archive.
    ///
    /// # Errors
    ///
    /// `AuthFailed` (403), `ArchiveNotFound` (404), `ArchiveError` (409, not
    /// in started state), `RequestFailed` otherwise.
    #[instrument(skip_all, fields(archive_id = %archive_id))]
    pub async fn stop_archive(&self, archive_id: &str) -> Result<Archive, OpenTokError> {
        let url = format!("{}/stop", self.config.archive_url(Some(archive_id)));
        let request = self.request(Method::Post, url);

        let response = self
            .send(ArchiveOperation::Stop, request, archive_id)
            .await?;
        let archive: Archive = parse_body(&response)?;

        debug!(target: "opentok.archive", status = %archive.status, "Archive stopped");
        Ok(archive)
    }

    /// Fetch an archive snapshot.
    ///
    /// # Errors
    ///
    /// `AuthFailed` (403), `ArchiveNotFound` (404), `RequestFailed` otherwise.
    #[instrument(skip_all, fields(archive_id = %archive_id))]
    pub async fn get_archive(&self, archive_id: &str) -> Result<Archive, OpenTokError> {
        let request = self.request(Method::Get, self.config.archive_url(Some(archive_id)));

        let response = self.send(ArchiveOperation::Get, request, archive_id).await?;
        parse_body(&response)
    }

    /// Fetch one page of archives.
    ///
    /// Omitted `offset`/`count` leave the paging to the platform's defaults.
    ///
    /// # Errors
    ///
    /// `AuthFailed` (403), `ArchiveNotFound` (404), `RequestFailed` otherwise.
    #[instrument(skip_all, fields(offset = ?offset, count = ?count))]
    pub async fn list_archives(
        &self,
        offset: Option<u32>,
        count: Option<u32>,
    ) -> Result<ArchiveList, OpenTokError> {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if let Some(offset) = offset {
            query.append_pair("offset", &offset.to_string());
        }
        if let Some(count) = count {
            query.append_pair("count", &count.to_string());
        }
        let query = query.finish();

        let mut url = self.config.archive_url(None);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }

        let request = self.request(Method::Get, url);
        let response = self.send(ArchiveOperation::List, request, "").await?;
        let list: ArchiveList = parse_body(&response)?;

        debug!(target: "opentok.archive", count = list.count, page = list.len(), "Archives listed");
        Ok(list)
    }

    /// Delete an archive.
    ///
    /// # Errors
    ///
    /// `AuthFailed` (403), `ArchiveNotFound` (404), `RequestFailed` otherwise.
    #[instrument(skip_all, fields(archive_id = %archive_id))]
    pub async fn delete_archive(&self, archive_id: &str) -> Result<(), OpenTokError> {
        let request = self.request(Method::Delete, self.config.archive_url(Some(archive_id)));

        self.send(ArchiveOperation::Delete, request, archive_id)
            .await?;

        debug!(target: "opentok.archive", "Archive deleted");
        Ok(())
    }

    fn request(&self, method: Method, url: String) -> HttpRequest {
        with_partner_auth(HttpRequest::new(method, url), &self.config.credentials)
            .header("Content-Type", "application/json")
    }

    /// Issue the request and turn any non-success status into an error.
    async fn send(
        &self,
        operation: ArchiveOperation,
        request: HttpRequest,
        subject: &str,
    ) -> Result<HttpResponse, OpenTokError> {
        let response = self.transport.request(request).await.map_err(|e| {
            warn!(
                target: "opentok.archive",
                operation = operation.as_str(),
                error = %e,
                "Archive request failed"
            );
            OpenTokError::from(e)
        })?;

        if response.is_success() {
            return Ok(response);
        }

        warn!(
            target: "opentok.archive",
            operation = operation.as_str(),
            status = response.status,
            "Archive request rejected"
        );
        Err(operation.error_for(&response, subject))
    }
}

fn parse_body<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, OpenTokError> {
    serde_json::from_str(&response.body).map_err(|e| {
        warn!(target: "opentok.archive", status = response.status, error = %e, "Invalid archive response body");
        OpenTokError::request_failed(
            Some(response.status),
            format!("Failed to parse archive response: {e}"),
        )
    })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::models::ArchiveStatus;
    use crate::services::transport::mock::MockTransport;
    use crate::services::PARTNER_AUTH_HEADER;
    use serde_json::json;

    const ARCHIVE_ID: &str = "30b3ebf1-ba36-4f5b-8def-6f70d9986fe9";
    const SESSION_ID: &str = "SESSIONID";

    fn archive(status: &str) -> serde_json::Value {
        json!({
            "createdAt": 1395183243556_i64,
            "duration": 0,
            "id": ARCHIVE_ID,
            "name": "ARCHIVE NAME",
            "partnerId": 123456,
            "reason": "",
            "sessionId": SESSION_ID,
            "size": 0,
            "status": status,
            "url": null
        })
    }

    fn test_client(mock: MockTransport) -> (ArchiveClient, Arc<MockTransport>) {
        let mock = Arc::new(mock);
        let config = Arc::new(OpenTokConfig::new("123456", "secret"));
        (ArchiveClient::new(config, mock.clone()), mock)
    }

    #[tokio::test]
    async fn test_start_archive() {
        let (client, mock) = test_client(MockTransport::new().respond_json(200, &archive("started")));

        let archive = client
            .start_archive(SESSION_ID, Some("ARCHIVE NAME"))
            .await
            .unwrap();

        assert_eq!(archive.id, ARCHIVE_ID);
        assert_eq!(archive.status, ArchiveStatus::Started);
        assert_eq!(archive.session_id, SESSION_ID);

        let request = mock.last_request().unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(
            request.url,
            "https://api.opentok.com/v2/partner/123456/archive"
        );
        assert_eq!(request.header_value("Content-Type"), Some("application/json"));
        assert_eq!(request.header_value(PARTNER_AUTH_HEADER), Some("123456:secret"));

        let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"sessionId": SESSION_ID, "name": "ARCHIVE NAME"}));
    }

    #[tokio::test]
    async fn test_start_archive_without_name() {
        let (client, mock) = test_client(MockTransport::new().respond_json(200, &archive("started")));

        client.start_archive(SESSION_ID, None).await.unwrap();

        let body: serde_json::Value =
            serde_json::from_str(mock.last_request().unwrap().body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"sessionId": SESSION_ID}));
    }

    #[tokio::test]
    async fn test_start_then_stop() {
        let (client, mock) = test_client(
            MockTransport::new()
                .respond_json(200, &archive("started"))
                .respond_json(200, &archive("stopped")),
        );

        let started = client.start_archive(SESSION_ID, None).await.unwrap();
        let stopped = client.stop_archive(&started.id).await.unwrap();

        assert_eq!(started.id, stopped.id);
        assert_eq!(stopped.status, ArchiveStatus::Stopped);

        let request = mock.last_request().unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(
            request.url,
            format!("https://api.opentok.com/v2/partner/123456/archive/{ARCHIVE_ID}/stop")
        );
    }

    #[tokio::test]
    async fn test_start_archive_error_mapping() {
        let cases: [(u16, &str); 4] = [(403, "auth"), (400, "invalid"), (404, "missing"), (500, "other")];

        for (status, label) in cases {
            let (client, _) = test_client(MockTransport::new().respond(status, ""));
            let err = client.start_archive(SESSION_ID, None).await.unwrap_err();
            let ok = match status {
                403 => matches!(err, OpenTokError::AuthFailed { .. }),
                400 => matches!(err, OpenTokError::InvalidSession(_)),
                404 => matches!(err, OpenTokError::SessionNotFound(_)),
                _ => matches!(
                    err,
                    OpenTokError::RequestFailed {
                        status: Some(500),
                        ..
                    }
                ),
            };
            assert!(ok, "{label}: unexpected {err:?}");
        }
    }

    #[tokio::test]
    async fn test_start_archive_conflict_uses_platform_message() {
        let (client, _) = test_client(MockTransport::new().respond_json(
            409,
            &json!({"message": "Session is already being recorded"}),
        ));

        let err = client.start_archive(SESSION_ID, None).await.unwrap_err();
        match err {
            OpenTokError::ArchiveError(message) => {
                assert_eq!(message, "Session is already being recorded");
            }
            other => panic!("expected ArchiveError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_start_archive_conflict_without_body() {
        let (client, _) = test_client(MockTransport::new().respond(409, ""));

        let err = client.start_archive(SESSION_ID, None).await.unwrap_err();
        assert!(matches!(err, OpenTokError::ArchiveError(ref m) if m.contains(SESSION_ID)));
    }

    #[tokio::test]
    async fn test_stop_archive_error_mapping() {
        let (client, _) = test_client(MockTransport::new().respond(409, ""));
        let err = client.stop_archive(ARCHIVE_ID).await.unwrap_err();
        assert!(
            matches!(err, OpenTokError::ArchiveError(ref m) if m == "Archive is not in started state")
        );

        let (client, _) = test_client(MockTransport::new().respond(404, ""));
        let err = client.stop_archive(ARCHIVE_ID).await.unwrap_err();
        assert!(matches!(err, OpenTokError::ArchiveNotFound(_)));

        let (client, _) = test_client(MockTransport::new().respond(400, ""));
        let err = client.stop_archive(ARCHIVE_ID).await.unwrap_err();
        assert!(matches!(
            err,
            OpenTokError::RequestFailed {
                status: Some(400),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_get_archive() {
        let (client, mock) = test_client(MockTransport::new().respond_json(200, &archive("available")));

        let archive = client.get_archive(ARCHIVE_ID).await.unwrap();
        assert_eq!(archive.status, ArchiveStatus::Available);
        assert_eq!(archive.partner_id, "123456");

        let request = mock.last_request().unwrap();
        assert_eq!(request.method, Method::Get);
        assert!(request.url.ends_with(&format!("/archive/{ARCHIVE_ID}")));
        assert!(request.body.is_none());
    }

    #[tokio::test]
    async fn test_get_archive_not_found() {
        let (client, _) = test_client(MockTransport::new().respond(404, ""));

        let err = client.get_archive(ARCHIVE_ID).await.unwrap_err();
        assert!(matches!(err, OpenTokError::ArchiveNotFound(ref m) if m.contains(ARCHIVE_ID)));
    }

    #[tokio::test]
    async fn test_get_archive_forbidden() {
        let (client, _) = test_client(MockTransport::new().respond(403, ""));

        let err = client.get_archive(ARCHIVE_ID).await.unwrap_err();
        assert!(matches!(err, OpenTokError::AuthFailed { .. }));
    }

    #[tokio::test]
    async fn test_success_with_invalid_body() {
        let (client, _) = test_client(MockTransport::new().respond(200, "not json"));

        let err = client.get_archive(ARCHIVE_ID).await.unwrap_err();
        assert!(matches!(
            err,
            OpenTokError::RequestFailed {
                status: Some(200),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_list_archives() {
        let mut first = archive("available");
        first["id"] = json!("first");
        let mut second = archive("stopped");
        second["id"] = json!("second");

        let (client, mock) = test_client(
            MockTransport::new().respond_json(200, &json!({"count": 2, "items": [first, second]})),
        );

        let list = client.list_archives(None, None).await.unwrap();
        assert_eq!(list.count, 2);
        let ids: Vec<_> = list.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);

        let request = mock.last_request().unwrap();
        assert_eq!(
            request.url,
            "https://api.opentok.com/v2/partner/123456/archive"
        );
    }

    #[tokio::test]
    async fn test_list_archives_paging_query() {
        let page = json!({"count": 0, "items": []});
        let (client, mock) = test_client(
            MockTransport::new()
                .respond_json(200, &page)
                .respond_json(200, &page)
                .respond_json(200, &page),
        );

        client.list_archives(Some(10), Some(5)).await.unwrap();
        client.list_archives(Some(3), None).await.unwrap();
        client.list_archives(None, Some(50)).await.unwrap();

        let queries: Vec<_> = mock
            .requests()
            .into_iter()
            .map(|r| r.url.rsplit('/').next().unwrap().to_string())
            .collect();
        assert_eq!(
            queries,
            vec!["archive?offset=10&count=5", "archive?offset=3", "archive?count=50"]
        );
    }

    #[tokio::test]
    async fn test_delete_archive() {
        let (client, mock) = test_client(MockTransport::new().respond(204, ""));

        client.delete_archive(ARCHIVE_ID).await.unwrap();

        let request = mock.last_request().unwrap();
        assert_eq!(request.method, Method::Delete);
        assert!(request.url.ends_with(&format!("/archive/{ARCHIVE_ID}")));
    }

    #[tokio::test]
    async fn test_delete_archive_not_found() {
        let (client, _) = test_client(MockTransport::new().respond(404, ""));

        let err = client.delete_archive(ARCHIVE_ID).await.unwrap_err();
        assert!(matches!(err, OpenTokError::ArchiveNotFound(_)));
    }

    #[tokio::test]
    async fn test_archive_id_stays_in_path_segment() {
        let (client, mock) = test_client(
            MockTransport::new()
                .respond_json(200, &archive("stopped"))
                .respond(204, ""),
        );

        client.stop_archive("x/../../session?y#z").await.unwrap();
        client.delete_archive("x/../../session?y#z").await.unwrap();

        let requests = mock.requests();
        assert_eq!(
            requests[0].url,
            "https://api.opentok.com/v2/partner/123456/archive/x%2F..%2F..%2Fsession%3Fy%23z/stop"
        );
        assert_eq!(
            requests[1].url,
            "https://api.opentok.com/v2/partner/123456/archive/x%2F..%2F..%2Fsession%3Fy%23z"
        );
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let (client, _) = test_client(MockTransport::new().fail("connection reset"));

        let err = client.delete_archive(ARCHIVE_ID).await.unwrap_err();
        assert!(matches!(err, OpenTokError::RequestFailed { status: None, .. }));
    }
}
