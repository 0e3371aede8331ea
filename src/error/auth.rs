//! Authentication-related error types.

use std::fmt;

/// Authentication errors.
///
/// `authenticate()` falls back silently to a cached token when the network
/// call fails, so these errors surface only when no cached token exists
/// either.
#[derive(Debug, Clone)]
pub enum AuthError {
    /// The authentication request could not be sent or timed out.
    RequestFailed { message: String },

    /// The server rejected the authentication attempt.
    Rejected { status: u16, message: String },

    /// The server response could not be parsed.
    InvalidResponse { message: String },
}

impl AuthError {
    /// Check if this error is a transient condition worth retrying on a
    /// later tick.
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::RequestFailed { .. } => true,
            AuthError::Rejected { status, .. } => (500..600).contains(status),
            AuthError::InvalidResponse { .. } => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::RequestFailed { .. } => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            AuthError::Rejected { status, .. } => match *status {
                403 => "This app build was not accepted by the server.".to_string(),
                _ => "The server rejected the sign-in attempt.".to_string(),
            },
            AuthError::InvalidResponse { .. } => {
                "The server returned an unexpected response.".to_string()
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::RequestFailed { .. } => "E_AUTH_REQUEST",
            AuthError::Rejected { .. } => "E_AUTH_REJECTED",
            AuthError::InvalidResponse { .. } => "E_AUTH_RESPONSE",
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::RequestFailed { message } => {
                write!(f, "Authentication request failed: {}", message)
            }
            AuthError::Rejected { status, message } => {
                write!(f, "Authentication rejected ({}): {}", status, message)
            }
            AuthError::InvalidResponse { message } => {
                write!(f, "Invalid authentication response: {}", message)
            }
        }
    }
}

impl std::error::Error for AuthError {}
