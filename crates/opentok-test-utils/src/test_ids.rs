//! Fixed test IDs for deterministic tests
//!
//! Every value here is a constant so failures reproduce exactly.

// Partner credentials
pub const TEST_API_KEY: &str = "123456";
pub const TEST_API_SECRET: &str = "1234567890abcdef1234567890abcdef1234567890";

// A second partner, for cross-partner checks
pub const OTHER_API_KEY: &str = "654321";
pub const OTHER_API_SECRET: &str = "fedcba0987654321fedcba0987654321fedcba0987";

// Archives
pub const TEST_ARCHIVE_ID: &str = "30b3ebf1-ba36-4f5b-8def-6f70d9986fe9";
pub const TEST_ARCHIVE_ID_2: &str = "b40ef09b-3811-4726-b508-e41a0f96c68f";
pub const TEST_ARCHIVE_NAME: &str = "ARCHIVE NAME";

// Opaque session ID used in archive payloads
pub const TEST_ARCHIVE_SESSION_ID: &str = "SESSIONID";

// Archive creation time (epoch milliseconds)
pub const TEST_CREATED_AT_MS: i64 = 1_395_183_243_556;
