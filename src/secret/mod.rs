//! Short-lived channel-access secret lifecycle.

mod broker;

pub use broker::{decrypt_wire, encrypt_wire, SecretBroker};
