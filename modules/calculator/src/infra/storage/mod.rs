//! Storage backends for history and credentials.

pub mod firestore;
pub mod in_memory;

use std::sync::Arc;

use tracing::info;

use crate::config::{CalculatorConfig, StorageConfig};
use crate::domain::error::CredentialError;
use crate::domain::repo::{CredentialStore, HistoryStore};
use crate::infra::password::PasswordHasher;

use self::firestore::{FirestoreClient, FirestoreCredentialStore, FirestoreHistoryStore};
use self::in_memory::{InMemoryCredentialStore, InMemoryHistoryStore};

/// History and credential stores built from the same backend selection.
pub struct Stores {
    pub history: Arc<dyn HistoryStore>,
    pub credentials: Arc<dyn CredentialStore>,
}

/// Build both stores for the configured backend.
///
/// # Errors
/// Returns [`StorageInitError`] if the password cost parameters are invalid
/// or the Firestore client cannot be constructed.
pub fn build_stores(cfg: &CalculatorConfig) -> Result<Stores, StorageInitError> {
    let hasher = PasswordHasher::new(&cfg.password_hash)?;

    match &cfg.storage {
        StorageConfig::Memory => {
            info!("using in-memory storage");
            Ok(Stores {
                history: Arc::new(InMemoryHistoryStore::new()),
                credentials: Arc::new(InMemoryCredentialStore::new(hasher)),
            })
        }
        StorageConfig::Firestore(fs) => {
            info!(project_id = %fs.project_id, database = %fs.database, "using firestore storage");
            let client = Arc::new(FirestoreClient::new(fs)?);
            Ok(Stores {
                history: Arc::new(FirestoreHistoryStore::new(client.clone())),
                credentials: Arc::new(FirestoreCredentialStore::new(client, hasher)),
            })
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageInitError {
    #[error("invalid password hash settings: {0}")]
    PasswordHash(#[from] CredentialError),

    #[error("firestore client: {0}")]
    Firestore(#[from] firestore::FirestoreError),
}
