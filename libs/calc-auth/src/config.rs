use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

const DEFAULT_TTL_SECS: u64 = 24 * 60 * 60;

/// Session token settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Shared HMAC secret. Never serialized back out.
    #[serde(default = "empty_secret", serialize_with = "redact")]
    pub secret: SecretString,

    /// Token lifetime in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("session secret must not be empty")]
    EmptySecret,

    #[error("session ttl must be greater than zero")]
    ZeroTtl,
}

impl SessionConfig {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::from(secret.into()),
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }

    /// # Errors
    /// Returns [`ConfigError`] when the secret is empty or the ttl is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.expose_secret().is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if self.ttl_secs == 0 {
            return Err(ConfigError::ZeroTtl);
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: empty_secret(),
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL_SECS
}

fn redact<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    if secret.expose_secret().is_empty() {
        serializer.serialize_str("")
    } else {
        serializer.serialize_str("<redacted>")
    }
}
