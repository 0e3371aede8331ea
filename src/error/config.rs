//! Configuration synchronization error types.

use std::fmt;

use super::AuthError;
use crate::traits::HttpError;

/// Configuration synchronization errors.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// The fetched document's signature did not verify. The previously
    /// cached document is never replaced on this error. Logged distinctly
    /// from transport failures since it may indicate tampering.
    InvalidSignature,

    /// The fetch failed and no cached document exists, not even a stale one.
    NoConfigAvailable,

    /// A valid token could not be obtained for the fetch.
    Auth(AuthError),

    /// Transient transport or HTTP failure.
    Fetch(HttpError),

    /// The server response could not be parsed as a config document.
    InvalidResponse { message: String },
}

impl ConfigError {
    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::InvalidSignature => "E_CFG_SIGNATURE",
            ConfigError::NoConfigAvailable => "E_CFG_NONE",
            ConfigError::Auth(_) => "E_CFG_AUTH",
            ConfigError::Fetch(_) => "E_CFG_FETCH",
            ConfigError::InvalidResponse { .. } => "E_CFG_RESPONSE",
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidSignature => {
                write!(f, "Config signature verification failed")
            }
            ConfigError::NoConfigAvailable => {
                write!(f, "No configuration available (no cache, fetch failed)")
            }
            ConfigError::Auth(e) => write!(f, "Config fetch not authenticated: {}", e),
            ConfigError::Fetch(e) => write!(f, "Config fetch failed: {}", e),
            ConfigError::InvalidResponse { message } => {
                write!(f, "Invalid config response: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Auth(e) => Some(e),
            ConfigError::Fetch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AuthError> for ConfigError {
    fn from(e: AuthError) -> Self {
        ConfigError::Auth(e)
    }
}

impl From<HttpError> for ConfigError {
    fn from(e: HttpError) -> Self {
        ConfigError::Fetch(e)
    }
}
