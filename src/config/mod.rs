//! Signed remote configuration: document model, signature verification,
//! version gate, and the synchronizer state machine.

mod document;
mod synchronizer;
mod version;

pub use document::{canonical_json, sign_document, verify_signature, ConfigDocument, FeatureFlags, SecurityPolicy};
pub use synchronizer::{ConfigSynchronizer, RefreshOutcome, SyncState};
pub use version::{compare_versions, is_older_than};
