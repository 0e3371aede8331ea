//! App-level authentication.
//!
//! [`TokenAuthority`] owns the credential record and the token lifecycle;
//! [`Credentials`] is the persisted record; [`AppIdentity`] is the install
//! fingerprint sent with authentication requests.

mod authority;
mod credentials;

pub use authority::{AppIdentity, TokenAuthority};
pub use credentials::Credentials;
