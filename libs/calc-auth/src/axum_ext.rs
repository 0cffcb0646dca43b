//! Axum extractors and middleware for session auth

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{errors::AuthError, session::SessionVerifier};

/// Identity attached to a request by [`require_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub username: String,
}

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthSession>()
            .cloned()
            .ok_or(AuthError::Internal(
                "AuthSession not found - session middleware not configured".to_owned(),
            ))
    }
}

/// Request gate for protected routes.
///
/// Rejects the request with 401 unless it carries `Authorization: Bearer <token>`
/// with a token that verifies; otherwise inserts [`AuthSession`] and continues.
pub async fn require_session(
    State(verifier): State<Arc<SessionVerifier>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match extract_bearer_token(request.headers()) {
        Ok(token) => token,
        Err(err) => return err.into_response(),
    };

    let username = match verifier.verify(token) {
        Ok(username) => username,
        Err(err) => {
            tracing::debug!(error = %err, "rejecting session token");
            return AuthError::InvalidToken(err).into_response();
        }
    };

    request.extensions_mut().insert(AuthSession { username });
    next.run(request).await
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// # Errors
/// [`AuthError::MissingToken`] if the header is absent or empty,
/// [`AuthError::InvalidFormat`] if it is not exactly `Bearer <token>`.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)
        .map(|v| v.to_str().map_err(|_| AuthError::InvalidFormat))
        .transpose()?
        .unwrap_or_default();

    if value.is_empty() {
        return Err(AuthError::MissingToken);
    }

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::InvalidFormat),
    }
}
