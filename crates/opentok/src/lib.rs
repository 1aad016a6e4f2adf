//! OpenTok Server SDK
//!
//! Server-side client for the OpenTok real-time video platform. It mints
//! signed, time-limited client tokens locally and manages sessions and
//! archives (server-side recordings) through the platform's REST API.
//!
//! # Modules
//!
//! - `client` - the [`OpenTok`] entry point
//! - `config` - credentials, endpoint and timeout configuration
//! - `crypto` - HMAC-SHA1 signing and nonce generation
//! - `errors` - Error types
//! - `models` - Session and archive snapshots
//! - `secret` - Secret types that keep the API secret out of logs
//! - `services` - REST clients and the HTTP transport seam
//! - `token` - Session ID validation and token encoding
//!
//! # Logging
//!
//! The crate emits `tracing` events under the targets `opentok.token`,
//! `opentok.session`, `opentok.archive` and `opentok.transport`. It never
//! installs a subscriber.

pub mod client;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod models;
pub mod secret;
pub mod services;
pub mod token;

pub use client::OpenTok;
pub use config::{ConfigError, Credentials, OpenTokConfig};
pub use errors::{OpenTokError, Result};
pub use models::{Archive, ArchiveList, ArchiveStatus, Session, SessionProperties};
pub use token::{ExpireTime, Role, TokenOptions};
