//! HS256 session token issuing and verification.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use time::{Duration, OffsetDateTime};

use crate::claims::SessionClaims;
use crate::config::{ConfigError, SessionConfig};
use crate::errors::SessionError;

/// Mints signed session tokens.
#[derive(Clone)]
pub struct SessionIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl SessionIssuer {
    /// # Errors
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn new(cfg: &SessionConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            key: EncodingKey::from_secret(cfg.secret.expose_secret().as_bytes()),
            ttl: Duration::seconds(i64::try_from(cfg.ttl_secs).unwrap_or(i64::MAX)),
        })
    }

    /// Issue a token for `username` valid for the configured lifetime from now.
    ///
    /// # Errors
    /// Returns [`SessionError::Signing`] if the token cannot be produced.
    pub fn issue(&self, username: &str) -> Result<String, SessionError> {
        self.issue_at(username, OffsetDateTime::now_utc())
    }

    /// Issue a token as if the current instant were `now`.
    ///
    /// # Errors
    /// Returns [`SessionError::Signing`] if the expiry overflows or signing fails.
    pub fn issue_at(&self, username: &str, now: OffsetDateTime) -> Result<String, SessionError> {
        let expires_at = now
            .checked_add(self.ttl)
            .ok_or_else(|| SessionError::Signing("expiry out of range".to_owned()))?;
        let claims = SessionClaims::new(username, expires_at);

        encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| SessionError::Signing(e.to_string()))
    }
}

/// Checks signature and expiry of inbound session tokens.
#[derive(Clone)]
pub struct SessionVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl SessionVerifier {
    /// # Errors
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn new(cfg: &SessionConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against an explicit clock in `verify_at`
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        let empty_claims: &[&str] = &[];
        validation.set_required_spec_claims(empty_claims);

        Ok(Self {
            key: DecodingKey::from_secret(cfg.secret.expose_secret().as_bytes()),
            validation,
        })
    }

    /// Verify `token` and return the username it was issued for.
    ///
    /// # Errors
    /// Returns [`SessionError::Malformed`], [`SessionError::InvalidSignature`]
    /// or [`SessionError::Expired`].
    pub fn verify(&self, token: &str) -> Result<String, SessionError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Verify `token` as if the current instant were `now`.
    ///
    /// # Errors
    /// See [`SessionVerifier::verify`].
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<String, SessionError> {
        let data = decode::<SessionClaims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    SessionError::InvalidSignature
                }
                ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::Malformed,
            }
        })?;

        if data.claims.is_expired_at(now)? {
            return Err(SessionError::Expired);
        }

        Ok(data.claims.username)
    }
}

/// Build an issuer and a verifier sharing the same secret.
///
/// # Errors
/// Returns [`ConfigError`] if the configuration is invalid.
pub fn session_pair(cfg: &SessionConfig) -> Result<(SessionIssuer, SessionVerifier), ConfigError> {
    Ok((SessionIssuer::new(cfg)?, SessionVerifier::new(cfg)?))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn pair() -> (SessionIssuer, SessionVerifier) {
        session_pair(&SessionConfig::new("TEST_SECRET_KEY_FOR_JWT")).unwrap()
    }

    #[test]
    fn issued_token_verifies_to_username() {
        let (issuer, verifier) = pair();
        let token = issuer.issue("alice").unwrap();
        assert_eq!(verifier.verify(&token).unwrap(), "alice");
    }

    #[test]
    fn token_expires_after_24_hours() {
        let (issuer, verifier) = pair();
        let issued = OffsetDateTime::now_utc();
        let token = issuer.issue_at("alice", issued).unwrap();

        let just_before = issued + Duration::hours(24) - Duration::seconds(1);
        assert_eq!(verifier.verify_at(&token, just_before).unwrap(), "alice");

        let after = issued + Duration::hours(24) + Duration::seconds(1);
        assert_eq!(verifier.verify_at(&token, after), Err(SessionError::Expired));
    }

    #[test]
    fn token_issued_long_ago_is_expired_now() {
        let (issuer, verifier) = pair();
        let token = issuer
            .issue_at("alice", OffsetDateTime::now_utc() - Duration::hours(25))
            .unwrap();
        assert_eq!(verifier.verify(&token), Err(SessionError::Expired));
    }

    #[test]
    fn token_from_other_secret_has_invalid_signature() {
        let (issuer, _) = session_pair(&SessionConfig::new("other-secret")).unwrap();
        let (_, verifier) = pair();
        let token = issuer.issue("alice").unwrap();
        assert_eq!(verifier.verify(&token), Err(SessionError::InvalidSignature));
    }

    #[test]
    fn tampered_payload_has_invalid_signature() {
        let (issuer, verifier) = pair();
        let genuine = issuer.issue("alice").unwrap();
        let other = issuer.issue("mallory").unwrap();

        let genuine_parts: Vec<&str> = genuine.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", genuine_parts[0], other_parts[1], genuine_parts[2]);

        assert_eq!(verifier.verify(&forged), Err(SessionError::InvalidSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        let (_, verifier) = pair();
        assert_eq!(verifier.verify("not-a-token"), Err(SessionError::Malformed));
        assert_eq!(verifier.verify(""), Err(SessionError::Malformed));
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(SessionIssuer::new(&SessionConfig::default()).is_err());
        assert!(SessionVerifier::new(&SessionConfig::default()).is_err());
    }
}
