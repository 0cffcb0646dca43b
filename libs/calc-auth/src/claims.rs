use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::errors::SessionError;

/// Claims carried inside a session token.
///
/// Serializes as `{"username": "...", "exp": <unix seconds>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub username: String,
    pub exp: i64,
}

impl SessionClaims {
    #[must_use]
    pub fn new(username: impl Into<String>, expires_at: OffsetDateTime) -> Self {
        Self {
            username: username.into(),
            exp: expires_at.unix_timestamp(),
        }
    }

    /// Expiry instant encoded in the token.
    ///
    /// # Errors
    /// Returns [`SessionError::Malformed`] if `exp` is outside the representable range.
    pub fn expires_at(&self) -> Result<OffsetDateTime, SessionError> {
        OffsetDateTime::from_unix_timestamp(self.exp).map_err(|_| SessionError::Malformed)
    }

    /// Expired iff `now` is strictly past the expiry instant.
    ///
    /// # Errors
    /// Returns [`SessionError::Malformed`] if `exp` cannot be interpreted.
    pub fn is_expired_at(&self, now: OffsetDateTime) -> Result<bool, SessionError> {
        Ok(now > self.expires_at()?)
    }
}
