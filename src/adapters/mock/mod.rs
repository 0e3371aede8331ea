//! Mock adapter implementations for testing.
//!
//! These mocks implement the traits from `crate::traits` with configurable
//! behavior, allowing tests to run without network, file system, or
//! notification access.

mod http;
mod notifier;
mod store;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
pub use notifier::MockNotifier;
pub use store::MemoryStore;
