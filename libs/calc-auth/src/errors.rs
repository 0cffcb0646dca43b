use thiserror::Error;

/// Failures of issuing or verifying a session token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("could not sign token: {0}")]
    Signing(String),
}

/// Rejections produced by the request gate.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization token required")]
    MissingToken,

    #[error("invalid token format")]
    InvalidFormat,

    #[error("invalid token")]
    InvalidToken(#[source] SessionError),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(feature = "axum-ext")]
impl axum::response::IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match self {
            AuthError::MissingToken | AuthError::InvalidFormat | AuthError::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Internal(ref msg) => {
                tracing::error!(error = %msg, "auth gate misconfigured");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}
