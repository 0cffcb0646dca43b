//! Mapping of domain failures onto HTTP status codes and plain-text bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::domain::error::{CredentialError, DomainError, HistoryError};

pub type ApiResult<T> = Result<T, ApiError>;

/// Status plus the plain-text message sent to the client.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Map `e`, using `infra_message` as the body for infrastructure failures.
    ///
    /// Infrastructure failures are logged in full; only the generic message
    /// reaches the client.
    #[must_use]
    pub fn from_domain(e: &DomainError, infra_message: &'static str) -> Self {
        match e {
            DomainError::InvalidOperands
            | DomainError::InvalidCredentialsFormat
            | DomainError::Arithmetic(_) => Self::new(StatusCode::BAD_REQUEST, e.to_string()),
            DomainError::Credentials(CredentialError::UserExists) => {
                Self::new(StatusCode::CONFLICT, "user already exists")
            }
            DomainError::Credentials(
                CredentialError::UserNotFound | CredentialError::InvalidCredentials,
            ) => Self::new(StatusCode::UNAUTHORIZED, "invalid username or password"),
            // Reproduces the established contract: an empty history is a 500
            DomainError::History(HistoryError::Empty) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "no history found")
            }
            DomainError::History(_) | DomainError::Credentials(_) | DomainError::Session(_) => {
                tracing::error!(error = %e, "request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, infra_message)
            }
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self::from_domain(&e, "internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}
