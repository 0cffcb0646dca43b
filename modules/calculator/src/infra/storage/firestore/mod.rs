//! Firestore backend over the REST v1 API.
//!
//! Works against both the hosted service and the local emulator (point
//! `base_url` at the emulator and use `owner` as the access token).

mod client;
mod credentials;
mod history;
mod value;

pub use client::{Document, FirestoreClient, FirestoreError};
pub use credentials::FirestoreCredentialStore;
pub use history::FirestoreHistoryStore;

use secrecy::SecretString;
use serde::{Deserialize, Serialize, Serializer};

pub(crate) const HISTORY_COLLECTION: &str = "calculations";
pub(crate) const USERS_COLLECTION: &str = "users";

/// Connection settings for a Firestore database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirestoreConfig {
    pub project_id: String,

    #[serde(default = "default_database")]
    pub database: String,

    /// Service root, e.g. `http://localhost:8080` for the emulator.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent with every request.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "redact"
    )]
    pub access_token: Option<SecretString>,

    /// Per-request deadline.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl FirestoreConfig {
    #[must_use]
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database: default_database(),
            base_url: default_base_url(),
            access_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_database() -> String {
    "(default)".to_owned()
}

fn default_base_url() -> String {
    "https://firestore.googleapis.com".to_owned()
}

fn default_timeout_secs() -> u64 {
    5
}

#[allow(clippy::ref_option)]
fn redact<S: Serializer>(token: &Option<SecretString>, serializer: S) -> Result<S::Ok, S::Error> {
    match token {
        Some(_) => serializer.serialize_str("<redacted>"),
        None => serializer.serialize_none(),
    }
}
