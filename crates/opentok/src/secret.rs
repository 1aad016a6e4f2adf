//! Secret types for the API secret.
//!
//! The partner API secret is both the HMAC key for every token and half of
//! the `X-TB-PARTNER-AUTH` header, so it is held in a [`SecretString`] from
//! the [`secrecy`] crate. Structs that derive `Debug` over it print
//! `[REDACTED]` instead of the value, and the buffer is zeroized on drop.
//!
//! # Example
//!
//! ```rust
//! use opentok::secret::{ExposeSecret, SecretString};
//!
//! let secret = SecretString::from("partner-secret");
//! assert!(!format!("{secret:?}").contains("partner-secret"));
//!
//! // Reading the value is always an explicit call.
//! let raw: &str = secret.expose_secret();
//! assert_eq!(raw, "partner-secret");
//! ```

pub use secrecy::{ExposeSecret, SecretString};
