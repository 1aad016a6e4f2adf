//! HTTP transport seam.
//!
//! The SDK issues exactly one request per operation through a [`Transport`].
//! [`ReqwestTransport`] is the production implementation; the `mock` module
//! provides a scripted transport for unit tests.
//!
//! Timeouts are the transport's business. There are no retries: a failed
//! request is reported to the caller immediately.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, instrument};

/// HTTP methods used by the platform API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        })
    }
}

/// An outgoing request.
///
/// `headers` may carry the partner secret, so `Debug` prints header names only.
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header_names: Vec<&str> = self.headers.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &header_names)
            .field("body_len", &self.body.as_ref().map(String::len))
            .finish()
    }
}

/// A received response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Any status below 300 counts as success.
    pub fn is_success(&self) -> bool {
        self.status < 300
    }
}

/// Errors raised before a response status is available.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Failed to read response body: {0}")]
    Body(String),
}

impl From<TransportError> for crate::errors::OpenTokError {
    fn from(err: TransportError) -> Self {
        crate::errors::OpenTokError::request_failed(None, err.to_string())
    }
}

/// The HTTP collaborator: one request in, one status and body out.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`Transport`] backed by a `reqwest` client with request and connect timeouts.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns `TransportError::Client` if the HTTP client cannot be built.
    pub fn new(request_timeout: Duration, connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| {
                error!(target: "opentok.transport", error = %e, "Failed to build HTTP client");
                TransportError::Client(e.to_string())
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip_all, fields(method = %request.method, url = %request.url))]
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            debug!(target: "opentok.transport", error = %e, "HTTP request failed");
            TransportError::Request(e.to_string())
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            debug!(target: "opentok.transport", error = %e, "Failed to read response body");
            TransportError::Body(e.to_string())
        })?;

        debug!(target: "opentok.transport", status, body_len = body.len(), "Response received");

        Ok(HttpResponse { status, body })
    }
}

/// Mock transport module for testing.
///
/// Responses are served in the order they were queued; every request is
/// recorded for later inspection.
pub mod mock {

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    enum Scripted {
        Response(HttpResponse),
        Failure(String),
    }

    /// Scripted transport for unit testing.
    #[derive(Default)]
    pub struct MockTransport {
        responses: Mutex<VecDeque<Scripted>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a response with the given status and body.
        #[must_use]
        pub fn respond(self, status: u16, body: impl Into<String>) -> Self {
            self.push(Scripted::Response(HttpResponse::new(status, body)));
            self
        }

        /// Queue a JSON response.
        #[must_use]
        pub fn respond_json(self, status: u16, body: &serde_json::Value) -> Self {
            self.respond(status, body.to_string())
        }

        /// Queue a transport-level failure.
        #[must_use]
        pub fn fail(self, reason: impl Into<String>) -> Self {
            self.push(Scripted::Failure(reason.into()));
            self
        }

        /// Requests received so far.
        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .map(|r| r.clone())
                .unwrap_or_default()
        }

        /// The most recent request, if any.
        pub fn last_request(&self) -> Option<HttpRequest> {
            self.requests().pop()
        }

        fn push(&self, scripted: Scripted) {
            if let Ok(mut responses) = self.responses.lock() {
                responses.push_back(scripted);
            }
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request);
            }

            let next = self
                .responses
                .lock()
                .ok()
                .and_then(|mut responses| responses.pop_front());

            match next {
                Some(Scripted::Response(response)) => Ok(response),
                Some(Scripted::Failure(reason)) => Err(TransportError::Request(reason)),
                None => Err(TransportError::Request(
                    "Mock transport has no scripted response".to_string(),
                )),
            }
        }
    }

    #[cfg(test)]
    #[allow(clippy::unwrap_used, clippy::expect_used)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_serves_in_order() {
            let mock = MockTransport::new()
                .respond(200, "first")
                .respond(404, "second");

            let r1 = mock
                .request(HttpRequest::new(Method::Get, "http://a"))
                .await
                .unwrap();
            let r2 = mock
                .request(HttpRequest::new(Method::Delete, "http://b"))
                .await
                .unwrap();

            assert_eq!(r1, HttpResponse::new(200, "first"));
            assert_eq!(r2, HttpResponse::new(404, "second"));

            let urls: Vec<_> = mock.requests().into_iter().map(|r| r.url).collect();
            assert_eq!(urls, vec!["http://a", "http://b"]);
        }

        #[tokio::test]
        async fn test_mock_failure_and_exhaustion() {
            let mock = MockTransport::new().fail("connection refused");

            let err = mock
                .request(HttpRequest::new(Method::Post, "http://a"))
                .await
                .unwrap_err();
            assert!(err.to_string().contains("connection refused"));

            let err = mock
                .request(HttpRequest::new(Method::Post, "http://a"))
                .await
                .unwrap_err();
            assert!(err.to_string().contains("no scripted response"));
            assert_eq!(mock.requests().len(), 2);
        }
    }
}
