use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use super::client::{FirestoreClient, FirestoreError};
use super::value;
use super::USERS_COLLECTION;
use crate::domain::error::CredentialError;
use crate::domain::model::CredentialRecord;
use crate::domain::repo::CredentialStore;
use crate::domain::service::is_valid_username;
use crate::infra::password::PasswordHasher;

/// Credentials in the `users` collection, one document per username.
pub struct FirestoreCredentialStore {
    client: Arc<FirestoreClient>,
    hasher: PasswordHasher,
}

impl FirestoreCredentialStore {
    #[must_use]
    pub fn new(client: Arc<FirestoreClient>, hasher: PasswordHasher) -> Self {
        Self { client, hasher }
    }
}

fn store_error(e: FirestoreError) -> CredentialError {
    match e {
        FirestoreError::Timeout => CredentialError::Timeout,
        FirestoreError::AlreadyExists => CredentialError::UserExists,
        FirestoreError::NotFound => CredentialError::UserNotFound,
        other => CredentialError::Transport(other.to_string()),
    }
}

#[async_trait]
impl CredentialStore for FirestoreCredentialStore {
    #[instrument(skip(self, password))]
    async fn register(&self, username: &str, password: &str) -> Result<(), CredentialError> {
        let record = CredentialRecord {
            username: username.to_owned(),
            password_hash: self.hasher.hash(password).await?,
        };

        // Create fails with 409 when the id is taken, so uniqueness holds
        // across concurrent registrations.
        self.client
            .create_document(
                USERS_COLLECTION,
                Some(username),
                value::encode_credential(&record),
            )
            .await
            .map_err(store_error)?;
        debug!("user document created");
        Ok(())
    }

    #[instrument(skip(self, password))]
    async fn authenticate(&self, username: &str, password: &str) -> Result<(), CredentialError> {
        // Dot segments would resolve to the collection or database path.
        if !is_valid_username(username) {
            return Err(CredentialError::UserNotFound);
        }

        let doc = self
            .client
            .get_document(USERS_COLLECTION, username)
            .await
            .map_err(store_error)?;

        let stored_hash = value::decode_password_hash(&doc.fields).map_err(|e| {
            warn!(error = %e, "malformed user document");
            CredentialError::Transport(format!("malformed user document: {e}"))
        })?;

        if self.hasher.verify(password, &stored_hash).await? {
            Ok(())
        } else {
            Err(CredentialError::InvalidCredentials)
        }
    }
}
