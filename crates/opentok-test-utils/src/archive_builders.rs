//! Builder patterns for archive response bodies
//!
//! Produces the JSON the platform returns for archive calls.

use crate::test_ids::{
    TEST_API_KEY, TEST_ARCHIVE_ID, TEST_ARCHIVE_NAME, TEST_ARCHIVE_SESSION_ID, TEST_CREATED_AT_MS,
};
use serde_json::{json, Value};

/// Builder for archive JSON
///
/// # Example
/// ```rust,ignore
/// let body = TestArchiveBuilder::new()
///     .with_id("abc")
///     .with_status("stopped")
///     .build();
/// ```
pub struct TestArchiveBuilder {
    id: String,
    name: Option<String>,
    status: String,
    session_id: String,
    partner_id: String,
    created_at: i64,
    size: u64,
    duration: u64,
    url: Option<String>,
}

impl TestArchiveBuilder {
    /// A freshly started archive with the fixed test IDs
    pub fn new() -> Self {
        Self {
            id: TEST_ARCHIVE_ID.to_string(),
            name: Some(TEST_ARCHIVE_NAME.to_string()),
            status: "started".to_string(),
            session_id: TEST_ARCHIVE_SESSION_ID.to_string(),
            partner_id: TEST_API_KEY.to_string(),
            created_at: TEST_CREATED_AT_MS,
            size: 0,
            duration: 0,
            url: None,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn with_name(mut self, name: Option<&str>) -> Self {
        self.name = name.map(str::to_string);
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub fn for_session(mut self, session_id: &str) -> Self {
        self.session_id = session_id.to_string();
        self
    }

    /// Mark the archive available with a download URL, size and duration
    pub fn available(mut self, size: u64, duration: u64) -> Self {
        self.status = "available".to_string();
        self.size = size;
        self.duration = duration;
        self.url = Some(format!(
            "https://tokbox.com.archive2.s3.amazonaws.com/{}/{}/archive.mp4",
            self.partner_id, self.id
        ));
        self
    }

    /// Build the archive JSON. The partner ID is emitted as a number, as the
    /// platform does.
    pub fn build(self) -> Value {
        let partner_id: Value = self
            .partner_id
            .parse::<u64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::from(self.partner_id.clone()));

        json!({
            "createdAt": self.created_at,
            "duration": self.duration,
            "id": self.id,
            "name": self.name,
            "partnerId": partner_id,
            "reason": "",
            "sessionId": self.session_id,
            "size": self.size,
            "status": self.status,
            "url": self.url,
        })
    }
}

impl Default for TestArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An archive list body: `{"count": count, "items": items}`.
pub fn archive_list_json(count: u64, items: Vec<Value>) -> Value {
    json!({ "count": count, "items": items })
}
