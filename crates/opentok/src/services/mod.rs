//! Clients for the platform REST API.
//!
//! # Components
//!
//! - `transport` - the HTTP seam (`Transport` trait, reqwest implementation, mock)
//! - `descriptor` - parsers for session creation responses
//! - `session_client` - session creation
//! - `archive_client` - archive start/stop/get/list/delete

pub mod archive_client;
pub mod descriptor;
pub mod session_client;
pub mod transport;

pub use archive_client::ArchiveClient;
pub use session_client::SessionClient;
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport, TransportError};
// Mock transport for testing (exposed for integration tests)
#[allow(unused_imports)]
pub use transport::mock::MockTransport;

use crate::config::{Credentials, USER_AGENT};

/// Header carrying `api_key:api_secret`.
pub const PARTNER_AUTH_HEADER: &str = "X-TB-PARTNER-AUTH";

/// Attach the headers every platform call carries.
pub(crate) fn with_partner_auth(request: HttpRequest, credentials: &Credentials) -> HttpRequest {
    request
        .header("User-Agent", USER_AGENT)
        .header(PARTNER_AUTH_HEADER, credentials.partner_auth())
}
