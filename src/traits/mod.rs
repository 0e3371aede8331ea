//! Trait abstractions for dependency injection.
//!
//! This module provides trait-based abstractions for external dependencies,
//! enabling dependency injection and testability:
//!
//! - [`HttpClient`]: HTTP operations (GET, POST)
//! - [`KeyValueStore`]: local persistence under the vault
//! - [`Notifier`]: platform notification shims
//!
//! Production implementations live in `crate::adapters`, mock
//! implementations in `crate::adapters::mock`.

mod http;
mod notifier;
mod store;

pub use http::{Headers, HttpClient, HttpError, Response};
pub use notifier::{LocalNotification, NotificationTier, Notifier, NotifyError};
pub use store::{KeyValueStore, StoreError};
