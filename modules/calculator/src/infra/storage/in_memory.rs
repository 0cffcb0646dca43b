//! In-memory history and credential stores.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::error::{CredentialError, HistoryError};
use crate::domain::model::{CredentialRecord, OperationRecord};
use crate::domain::repo::{CredentialStore, HistoryStore};
use crate::infra::password::PasswordHasher;

/// History kept in a single lock-guarded vector, listed in insertion order.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    records: RwLock<Vec<OperationRecord>>,
}

impl InMemoryHistoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, record: &OperationRecord) -> Result<(), HistoryError> {
        self.records.write().push(record.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<OperationRecord>, HistoryError> {
        let records = self.records.read();
        if records.is_empty() {
            return Err(HistoryError::Empty);
        }
        Ok(records.clone())
    }

    async fn clear(&self) -> Result<(), HistoryError> {
        self.records.write().clear();
        Ok(())
    }
}

/// Credentials keyed by username.
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<String, CredentialRecord>>,
    hasher: PasswordHasher,
}

impl InMemoryCredentialStore {
    #[must_use]
    pub fn new(hasher: PasswordHasher) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            hasher,
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn register(&self, username: &str, password: &str) -> Result<(), CredentialError> {
        // Skip the expensive hash for an obvious duplicate
        if self.users.read().contains_key(username) {
            return Err(CredentialError::UserExists);
        }

        let password_hash = self.hasher.hash(password).await?;

        // Re-checked under the write lock: a concurrent register may have won
        match self.users.write().entry(username.to_owned()) {
            Entry::Occupied(_) => Err(CredentialError::UserExists),
            Entry::Vacant(slot) => {
                slot.insert(CredentialRecord {
                    username: username.to_owned(),
                    password_hash,
                });
                Ok(())
            }
        }
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<(), CredentialError> {
        let stored_hash = self
            .users
            .read()
            .get(username)
            .map(|record| record.password_hash.clone())
            .ok_or(CredentialError::UserNotFound)?;

        if self.hasher.verify(password, &stored_hash).await? {
            Ok(())
        } else {
            Err(CredentialError::InvalidCredentials)
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::domain::model::Operation;
    use std::sync::Arc;
    use time::OffsetDateTime;

    fn record(operand1: f64) -> OperationRecord {
        OperationRecord::new(
            Operation::Add,
            operand1,
            1.0,
            operand1 + 1.0,
            OffsetDateTime::now_utc(),
        )
    }

    #[tokio::test]
    async fn empty_store_lists_as_empty() {
        let store = InMemoryHistoryStore::new();
        assert_eq!(store.list().await, Err(HistoryError::Empty));
    }

    #[tokio::test]
    async fn lists_in_insertion_order() {
        let store = InMemoryHistoryStore::new();
        for i in 0..5 {
            store.append(&record(f64::from(i))).await.unwrap();
        }

        let records = store.list().await.unwrap();
        let operands: Vec<f64> = records.iter().map(|r| r.operand1).collect();
        assert_eq!(operands, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let store = InMemoryHistoryStore::new();
        store.clear().await.unwrap();
        store.append(&record(1.0)).await.unwrap();
        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.list().await, Err(HistoryError::Empty));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_are_not_lost() {
        let store = Arc::new(InMemoryHistoryStore::new());

        let handles: Vec<_> = (0..200)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.append(&record(f64::from(i))).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let mut operands: Vec<f64> = store
            .list()
            .await
            .unwrap()
            .iter()
            .map(|r| r.operand1)
            .collect();
        operands.sort_by(f64::total_cmp);
        let expected: Vec<f64> = (0..200).map(f64::from).collect();
        assert_eq!(operands, expected);
    }

    fn credentials() -> InMemoryCredentialStore {
        InMemoryCredentialStore::new(PasswordHasher::for_testing())
    }

    #[tokio::test]
    async fn register_then_authenticate() {
        let store = credentials();
        store.register("alice", "pw1").await.unwrap();
        store.authenticate("alice", "pw1").await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_register_fails_with_user_exists() {
        let store = credentials();
        store.register("bob", "pw1").await.unwrap();
        assert_eq!(
            store.register("bob", "pw2").await,
            Err(CredentialError::UserExists)
        );
        // the first password still applies
        store.authenticate("bob", "pw1").await.unwrap();
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let store = credentials();
        assert_eq!(
            store.authenticate("ghost", "pw").await,
            Err(CredentialError::UserNotFound)
        );
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let store = credentials();
        store.register("alice", "pw1").await.unwrap();
        assert_eq!(
            store.authenticate("alice", "pw2").await,
            Err(CredentialError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn stores_hash_not_password() {
        let store = credentials();
        store.register("alice", "pw1").await.unwrap();
        let users = store.users.read();
        let record = users.get("alice").unwrap();
        assert_ne!(record.password_hash, "pw1");
        assert!(record.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registration_admits_exactly_one() {
        let store = Arc::new(credentials());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.register("carol", &format!("pw{i}")).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => successes += 1,
                Err(e) => assert_eq!(e, CredentialError::UserExists),
            }
        }
        assert_eq!(successes, 1);
    }
}
