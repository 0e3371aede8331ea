//! Channel-access secret error types.

use std::fmt;

use super::AuthError;
use crate::traits::HttpError;

/// Errors obtaining the short-lived channel-access secret.
#[derive(Debug, Clone)]
pub enum SecretError {
    /// No valid app token exists and re-authentication also failed.
    Unavailable(AuthError),

    /// Transient transport or HTTP failure fetching the secret.
    Fetch(HttpError),

    /// The returned ciphertext could not be decrypted. Treated as
    /// data-absent: the caller retries on a later tick.
    Decrypt,

    /// The server response could not be parsed.
    InvalidResponse { message: String },
}

impl SecretError {
    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            SecretError::Unavailable(_) => "E_SECRET_AUTH",
            SecretError::Fetch(_) => "E_SECRET_FETCH",
            SecretError::Decrypt => "E_SECRET_DECRYPT",
            SecretError::InvalidResponse { .. } => "E_SECRET_RESPONSE",
        }
    }
}

impl fmt::Display for SecretError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretError::Unavailable(e) => {
                write!(f, "Secret unavailable, authentication failed: {}", e)
            }
            SecretError::Fetch(e) => write!(f, "Secret fetch failed: {}", e),
            SecretError::Decrypt => write!(f, "Secret ciphertext could not be decrypted"),
            SecretError::InvalidResponse { message } => {
                write!(f, "Invalid secret response: {}", message)
            }
        }
    }
}

impl std::error::Error for SecretError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SecretError::Unavailable(e) => Some(e),
            SecretError::Fetch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<HttpError> for SecretError {
    fn from(e: HttpError) -> Self {
        SecretError::Fetch(e)
    }
}
