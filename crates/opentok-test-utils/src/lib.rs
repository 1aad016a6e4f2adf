//! # OpenTok Test Utilities
//!
//! Shared test utilities for the OpenTok SDK.
//!
//! This crate provides:
//! - Fixed test credentials and IDs
//! - Session ID fixtures and session descriptor bodies
//! - Archive JSON builders (TestArchiveBuilder)
//! - Custom assertions (TokenAssertions trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use opentok_test_utils::*;
//!
//! #[test]
//! fn test_example() {
//!     let session_id = test_session_id(TEST_API_KEY);
//!     let token = opentok.generate_token(&session_id, &TokenOptions::default())?;
//!
//!     token
//!         .assert_valid_token()
//!         .assert_signed_with(TEST_API_SECRET)
//!         .assert_role("publisher");
//! }
//! ```

pub mod archive_builders;
pub mod assertions;
pub mod session_fixtures;
pub mod test_ids;

// Re-export commonly used items
pub use archive_builders::*;
pub use assertions::*;
pub use session_fixtures::*;
pub use test_ids::*;
