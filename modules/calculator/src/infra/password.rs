//! Argon2id password hashing in PHC string format.

use argon2::password_hash::{
    Error as PhcError, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;

use crate::config::PasswordHashConfig;
use crate::domain::error::CredentialError;

const SALT_LEN: usize = 16;

/// Salted, deliberately slow password hasher.
///
/// Work runs on the blocking pool so request tasks are not stalled.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// # Errors
    /// Returns [`CredentialError::Hashing`] if the cost parameters are out of range.
    pub fn new(cfg: &PasswordHashConfig) -> Result<Self, CredentialError> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| CredentialError::Hashing(e.to_string()))?;
        Ok(Self { params })
    }

    /// Minimum-cost parameters. Test use only.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            params: Params::new(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST, None)
                .unwrap_or_default(),
        }
    }

    /// # Errors
    /// Returns [`CredentialError::Hashing`] if hashing fails or the blocking task panics.
    pub async fn hash(&self, password: &str) -> Result<String, CredentialError> {
        let params = self.params.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hash_blocking(params, &password))
            .await
            .map_err(|e| CredentialError::Hashing(e.to_string()))?
    }

    /// Constant-time check of `password` against a stored PHC hash.
    ///
    /// # Errors
    /// Returns [`CredentialError::Hashing`] if the stored hash cannot be parsed.
    pub async fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, CredentialError> {
        let password = password.to_owned();
        let stored_hash = stored_hash.to_owned();
        tokio::task::spawn_blocking(move || verify_blocking(&password, &stored_hash))
            .await
            .map_err(|e| CredentialError::Hashing(e.to_string()))?
    }
}

fn hash_blocking(params: Params, password: &str) -> Result<String, CredentialError> {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt).map_err(|e| CredentialError::Hashing(e.to_string()))?;

    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::Hashing(e.to_string()))
}

fn verify_blocking(password: &str, stored_hash: &str) -> Result<bool, CredentialError> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| CredentialError::Hashing(e.to_string()))?;

    // Cost parameters are read from the PHC string itself
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PhcError::Password) => Ok(false),
        Err(e) => Err(CredentialError::Hashing(e.to_string())),
    }
}
