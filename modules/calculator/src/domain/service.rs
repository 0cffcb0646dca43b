use std::sync::Arc;

use calc_auth::SessionIssuer;
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};

use super::error::DomainError;
use super::model::{Operation, OperationRecord};
use super::repo::{CredentialStore, HistoryStore};

/// Domain service behind every calculator route.
///
/// Constructed once at startup and shared with handlers; holds no state of
/// its own beyond the injected stores and the session issuer.
#[derive(Clone)]
pub struct Service {
    history: Arc<dyn HistoryStore>,
    credentials: Arc<dyn CredentialStore>,
    sessions: SessionIssuer,
}

impl Service {
    #[must_use]
    pub fn new(
        history: Arc<dyn HistoryStore>,
        credentials: Arc<dyn CredentialStore>,
        sessions: SessionIssuer,
    ) -> Self {
        Self {
            history,
            credentials,
            sessions,
        }
    }

    /// Compute `operand1 <operation> operand2` and record it.
    ///
    /// Recording is best effort: a failed history write is logged and the
    /// result is still returned.
    ///
    /// # Errors
    /// Returns [`DomainError::Arithmetic`] for division or modulo by zero.
    #[instrument(skip(self, operation), fields(operation = %operation))]
    pub async fn calculate(
        &self,
        operation: Operation,
        operand1: f64,
        operand2: f64,
    ) -> Result<f64, DomainError> {
        let result = operation.apply(operand1, operand2)?;
        debug!(result, "computed");

        let record = OperationRecord::new(
            operation,
            operand1,
            operand2,
            result,
            OffsetDateTime::now_utc(),
        );
        if let Err(e) = self.history.append(&record).await {
            warn!(error = %e, "failed to save history");
        }

        Ok(result)
    }

    /// # Errors
    /// Returns [`DomainError::History`]; an empty store yields `HistoryError::Empty`.
    #[instrument(skip(self))]
    pub async fn history(&self) -> Result<Vec<OperationRecord>, DomainError> {
        let records = self.history.list().await?;
        debug!(count = records.len(), "history listed");
        Ok(records)
    }

    /// # Errors
    /// Returns [`DomainError::History`] if the store cannot be cleared.
    #[instrument(skip(self))]
    pub async fn reset_history(&self) -> Result<(), DomainError> {
        self.history.clear().await?;
        info!("history reset");
        Ok(())
    }

    /// # Errors
    /// [`DomainError::InvalidCredentialsFormat`] for empty fields or a username
    /// that cannot be used as a document id,
    /// [`DomainError::Credentials`] for store failures including duplicates.
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<(), DomainError> {
        validate_credentials(username, password)?;
        self.credentials.register(username, password).await?;
        info!(username, "user registered");
        Ok(())
    }

    /// Authenticate and mint a session token.
    ///
    /// # Errors
    /// [`DomainError::InvalidCredentialsFormat`] for empty fields or a username
    /// that cannot be used as a document id,
    /// [`DomainError::Credentials`] when authentication fails,
    /// [`DomainError::Session`] if the token cannot be signed.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<String, DomainError> {
        validate_credentials(username, password)?;
        self.credentials.authenticate(username, password).await?;
        let token = self.sessions.issue(username)?;
        info!(username, "session issued");
        Ok(token)
    }
}

fn validate_credentials(username: &str, password: &str) -> Result<(), DomainError> {
    if !is_valid_username(username) || password.is_empty() {
        return Err(DomainError::InvalidCredentialsFormat);
    }
    Ok(())
}

/// Usernames double as document ids, so they follow the document id rules:
/// no `/`, not `.` or `..`, and not of the reserved `__name__` form.
pub(crate) fn is_valid_username(username: &str) -> bool {
    let reserved = username.len() >= 4 && username.starts_with("__") && username.ends_with("__");
    !username.is_empty()
        && !username.contains('/')
        && username != "."
        && username != ".."
        && !reserved
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::domain::error::{ArithmeticError, CredentialError, HistoryError};
    use crate::infra::password::PasswordHasher;
    use crate::infra::storage::in_memory::{InMemoryCredentialStore, InMemoryHistoryStore};
    use async_trait::async_trait;
    use calc_auth::{SessionConfig, session_pair};
    use tracing_test::traced_test;

    struct FailingHistory;

    #[async_trait]
    impl HistoryStore for FailingHistory {
        async fn append(&self, _record: &OperationRecord) -> Result<(), HistoryError> {
            Err(HistoryError::Timeout)
        }

        async fn list(&self) -> Result<Vec<OperationRecord>, HistoryError> {
            Err(HistoryError::Transport("down".to_owned()))
        }

        async fn clear(&self) -> Result<(), HistoryError> {
            Err(HistoryError::Transport("down".to_owned()))
        }
    }

    fn credentials() -> Arc<dyn CredentialStore> {
        Arc::new(InMemoryCredentialStore::new(PasswordHasher::for_testing()))
    }

    fn service_with(history: Arc<dyn HistoryStore>) -> (Service, calc_auth::SessionVerifier) {
        let (issuer, verifier) = session_pair(&SessionConfig::new("service-test")).unwrap();
        (Service::new(history, credentials(), issuer), verifier)
    }

    #[tokio::test]
    async fn calculate_records_history() {
        let history = Arc::new(InMemoryHistoryStore::new());
        let (svc, _) = service_with(history.clone());

        assert_eq!(svc.calculate(Operation::Add, 10.0, 5.0).await.unwrap(), 15.0);
        assert_eq!(svc.calculate(Operation::Power, 2.0, 3.0).await.unwrap(), 8.0);

        let records = svc.history().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].operation, Operation::Add);
        assert_eq!(records[0].result, 15.0);
        assert_eq!(records[1].operation, Operation::Power);
    }

    #[tokio::test]
    async fn failed_computation_is_not_recorded() {
        let history = Arc::new(InMemoryHistoryStore::new());
        let (svc, _) = service_with(history.clone());

        let err = svc.calculate(Operation::Divide, 10.0, 0.0).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Arithmetic(ArithmeticError::DivisionByZero)
        ));
        assert!(matches!(
            svc.history().await,
            Err(DomainError::History(HistoryError::Empty))
        ));
    }

    #[tokio::test]
    async fn history_write_failure_does_not_fail_computation() {
        let (svc, _) = service_with(Arc::new(FailingHistory));
        assert_eq!(svc.calculate(Operation::Modulo, 11.0, 5.0).await.unwrap(), 1.0);
    }

    #[tokio::test]
    #[traced_test]
    async fn history_write_failure_is_logged() {
        let (svc, _) = service_with(Arc::new(FailingHistory));
        svc.calculate(Operation::Add, 1.0, 2.0).await.unwrap();
        assert!(logs_contain("failed to save history"));
    }

    #[tokio::test]
    async fn reset_clears_history() {
        let (svc, _) = service_with(Arc::new(InMemoryHistoryStore::new()));
        svc.calculate(Operation::Add, 1.0, 1.0).await.unwrap();
        svc.reset_history().await.unwrap();
        assert!(matches!(
            svc.history().await,
            Err(DomainError::History(HistoryError::Empty))
        ));
    }

    #[tokio::test]
    async fn login_issues_verifiable_token() {
        let (svc, verifier) = service_with(Arc::new(InMemoryHistoryStore::new()));
        svc.register("alice", "pw1").await.unwrap();

        let token = svc.login("alice", "pw1").await.unwrap();
        assert_eq!(verifier.verify(&token).unwrap(), "alice");
    }

    #[tokio::test]
    async fn login_with_wrong_password_fails() {
        let (svc, _) = service_with(Arc::new(InMemoryHistoryStore::new()));
        svc.register("alice", "pw1").await.unwrap();

        assert!(matches!(
            svc.login("alice", "nope").await,
            Err(DomainError::Credentials(CredentialError::InvalidCredentials))
        ));
    }

    #[tokio::test]
    async fn duplicate_registration_fails() {
        let (svc, _) = service_with(Arc::new(InMemoryHistoryStore::new()));
        svc.register("bob", "pw1").await.unwrap();
        assert!(matches!(
            svc.register("bob", "pw2").await,
            Err(DomainError::Credentials(CredentialError::UserExists))
        ));
    }

    #[tokio::test]
    async fn empty_credentials_are_rejected() {
        let (svc, _) = service_with(Arc::new(InMemoryHistoryStore::new()));
        assert!(matches!(
            svc.register("", "pw").await,
            Err(DomainError::InvalidCredentialsFormat)
        ));
        assert!(matches!(
            svc.login("bob", "").await,
            Err(DomainError::InvalidCredentialsFormat)
        ));
    }

    #[tokio::test]
    async fn usernames_that_are_not_document_ids_are_rejected() {
        let (svc, _) = service_with(Arc::new(InMemoryHistoryStore::new()));
        for username in [".", "..", "a/b", "/", "__name__", "____"] {
            assert!(
                matches!(
                    svc.register(username, "pw").await,
                    Err(DomainError::InvalidCredentialsFormat)
                ),
                "register accepted {username:?}"
            );
            assert!(
                matches!(
                    svc.login(username, "pw").await,
                    Err(DomainError::InvalidCredentialsFormat)
                ),
                "login accepted {username:?}"
            );
        }
    }

    #[tokio::test]
    async fn dotted_and_underscored_usernames_are_allowed() {
        let (svc, _) = service_with(Arc::new(InMemoryHistoryStore::new()));
        for username in ["a.b", "...", "__x", "x__", "_._"] {
            svc.register(username, "pw").await.unwrap();
            svc.login(username, "pw").await.unwrap();
        }
    }
}
