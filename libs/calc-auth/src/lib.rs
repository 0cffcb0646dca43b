//! Stateless session tokens for the calculator service.
//!
//! A [`SessionIssuer`] turns an authenticated username into a signed,
//! time-limited token; a [`SessionVerifier`] checks signature and expiry on
//! every protected request. With the `axum-ext` feature the crate also ships
//! the request gate middleware and the [`axum_ext::AuthSession`] extractor.

pub mod claims;
pub mod config;
pub mod errors;
pub mod session;

#[cfg(feature = "axum-ext")]
pub mod axum_ext;

pub use claims::SessionClaims;
pub use config::{ConfigError, SessionConfig};
pub use errors::{AuthError, SessionError};
pub use session::{SessionIssuer, SessionVerifier, session_pair};
