//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{sample_records, TestServer};
//!
//! #[tokio::test]
//! async fn test_fetch() {
//!     let server = TestServer::spawn(sample_records()).await;
//!     let api = server.api();
//!     assert!(api.fetch_notifications().await.is_ok());
//! }
//! ```

mod constants;
mod fixtures;
mod server;

// Public API - this is what tests import
pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{record, sample_records};
pub use server::{FakeNewsApi, TestServer};
