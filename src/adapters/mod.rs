//! Adapter implementations for the trait abstractions in `crate::traits`.
//!
//! - [`ReqwestHttpClient`]: production HTTP client with an explicit timeout
//! - [`FileStore`]: JSON-file key/value store under the app data directory
//! - [`OsNotifier`]: host OS notification shim
//! - [`mock`]: configurable mock implementations for tests

mod file_store;
pub mod mock;
mod os_notifier;
mod reqwest_http;

pub use file_store::FileStore;
pub use os_notifier::OsNotifier;
pub use reqwest_http::ReqwestHttpClient;
