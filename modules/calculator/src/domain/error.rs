use calc_auth::SessionError;
use thiserror::Error;

/// Failure modes of the arithmetic engine.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("cannot divide by zero")]
    DivisionByZero,

    #[error("cannot modulo by zero")]
    ModuloByZero,
}

/// History store failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// No records exist. Distinct from transport failures.
    #[error("no history found")]
    Empty,

    #[error("history store timed out")]
    Timeout,

    #[error("history store transport error: {0}")]
    Transport(String),

    #[error("invalid history document: {0}")]
    InvalidDocument(String),
}

/// Credential store failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("user already exists")]
    UserExists,

    #[error("user not found")]
    UserNotFound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("credential store timed out")]
    Timeout,

    #[error("credential store transport error: {0}")]
    Transport(String),
}

/// Errors surfaced by the domain service.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("invalid operands")]
    InvalidOperands,

    #[error("invalid credentials format")]
    InvalidCredentialsFormat,

    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Session(#[from] SessionError),
}
