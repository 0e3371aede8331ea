//! Credential record for the app-level authentication token.

use serde::{Deserialize, Serialize};

/// App-level authentication credentials.
///
/// Owned exclusively by [`TokenAuthority`](super::TokenAuthority); persisted
/// in encrypted form through the vault and mutated only on successful
/// authentication or explicit logout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Credentials {
    /// App token for API authentication.
    pub app_token: Option<String>,
    /// Token expiration time as Unix timestamp (seconds since epoch).
    pub expires_at: Option<i64>,
    /// The identifier of the signed-in user, when known.
    pub user_id: Option<String>,
}

impl Credentials {
    /// Create new empty credentials.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the credentials have an app token.
    pub fn has_token(&self) -> bool {
        self.app_token.is_some()
    }

    /// Check if the token is expired.
    ///
    /// A token with no expiration time is treated as unexpired: the server
    /// is the authority and will answer 401 when it disagrees.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => chrono::Utc::now().timestamp() >= expires_at,
            None => false,
        }
    }

    /// Check if the credentials are usable (has token and not expired).
    pub fn is_valid(&self) -> bool {
        self.has_token() && !self.is_expired()
    }
}
