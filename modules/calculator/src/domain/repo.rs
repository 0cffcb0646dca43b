use async_trait::async_trait;

use super::error::{CredentialError, HistoryError};
use super::model::OperationRecord;

/// Append-only log of operation records.
///
/// Ordering of [`HistoryStore::list`] is backend specific: the in-memory
/// backend returns insertion order (oldest first), the Firestore backend
/// returns records by descending timestamp (newest first).
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Add one record. Concurrent appends are neither lost nor duplicated.
    async fn append(&self, record: &OperationRecord) -> Result<(), HistoryError>;

    /// All stored records, or [`HistoryError::Empty`] when there are none.
    async fn list(&self) -> Result<Vec<OperationRecord>, HistoryError>;

    /// Remove every record. Clearing an empty store succeeds.
    async fn clear(&self) -> Result<(), HistoryError>;
}

/// Username to password-hash map.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Hash `password` and store it under `username`.
    /// Fails with [`CredentialError::UserExists`] if the username is taken.
    async fn register(&self, username: &str, password: &str) -> Result<(), CredentialError>;

    /// Check `password` against the stored hash.
    async fn authenticate(&self, username: &str, password: &str) -> Result<(), CredentialError>;
}
