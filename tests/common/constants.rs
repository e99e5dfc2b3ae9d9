//! Shared constants for end-to-end tests

/// Token the fake API accepts.
pub const TEST_TOKEN: &str = "test-token-123";

/// Number of unread records in [`super::sample_records`].
#[allow(dead_code)]
pub const SAMPLE_UNREAD: usize = 4;

/// Number of records in [`super::sample_records`].
#[allow(dead_code)]
pub const SAMPLE_TOTAL: usize = 6;

/// Request timeout for the client under test, in seconds.
pub const CLIENT_TIMEOUT_SEC: u64 = 5;
