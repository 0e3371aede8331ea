//! Polling-cycle and startup error types.

use std::fmt;

use super::{AuthError, ConfigError};
use crate::traits::HttpError;

/// Errors aborting a single polling cycle.
///
/// All variants are recoverable at the cycle level: the cycle produces zero
/// notifications, leaves persisted state untouched, and the scheduler
/// retries on the next tick.
#[derive(Debug, Clone)]
pub enum CycleError {
    /// No app token could be obtained for the gift fetch.
    Auth(AuthError),

    /// No configuration was available, not even a cached one.
    Config(ConfigError),

    /// The gift fetch failed.
    Fetch(HttpError),

    /// The gift feed response could not be parsed.
    InvalidResponse { message: String },
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleError::Auth(e) => write!(f, "Cycle skipped, authentication failed: {}", e),
            CycleError::Config(e) => write!(f, "Cycle skipped, no configuration: {}", e),
            CycleError::Fetch(e) => write!(f, "Cycle skipped, gift fetch failed: {}", e),
            CycleError::InvalidResponse { message } => {
                write!(f, "Cycle skipped, invalid gift feed response: {}", message)
            }
        }
    }
}

impl std::error::Error for CycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CycleError::Auth(e) => Some(e),
            CycleError::Config(e) => Some(e),
            CycleError::Fetch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AuthError> for CycleError {
    fn from(e: AuthError) -> Self {
        CycleError::Auth(e)
    }
}

impl From<ConfigError> for CycleError {
    fn from(e: ConfigError) -> Self {
        CycleError::Config(e)
    }
}

impl From<HttpError> for CycleError {
    fn from(e: HttpError) -> Self {
        CycleError::Fetch(e)
    }
}

/// First-launch blocking condition: no cached config and no network.
///
/// This is the only error surfaced to the user instead of silently retried;
/// everything the app needs to operate is missing.
#[derive(Debug, Clone)]
pub struct StartupError {
    pub auth: AuthError,
    pub config: ConfigError,
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "First launch requires a network connection (auth: {}; config: {})",
            self.auth, self.config
        )
    }
}

impl std::error::Error for StartupError {}
