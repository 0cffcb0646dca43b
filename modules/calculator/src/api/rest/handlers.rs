use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Extension, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use calc_auth::axum_ext::AuthSession;
use tracing::debug;

use crate::domain::error::DomainError;
use crate::domain::model::{Operation, OperationRecord};
use crate::domain::service::Service;

use super::dto::{
    CredentialsRequest, MessageResponse, OperandsQuery, ResultResponse, TokenResponse,
};
use super::error::{ApiError, ApiResult};

pub async fn calculate(
    operation: Operation,
    session: AuthSession,
    Extension(svc): Extension<Arc<Service>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Json<ResultResponse>> {
    // A malformed query string is reported the same way as a bad operand
    let Query(pairs) = query.map_err(|_| DomainError::InvalidOperands)?;
    let (operand1, operand2) = OperandsQuery::from_pairs(pairs).parse()?;

    debug!(username = %session.username, %operation, "calculate");
    let result = svc.calculate(operation, operand1, operand2).await?;
    Ok(Json(ResultResponse { result }))
}

pub async fn history(
    Extension(svc): Extension<Arc<Service>>,
) -> ApiResult<Json<Vec<OperationRecord>>> {
    let records = svc
        .history()
        .await
        .map_err(|e| ApiError::from_domain(&e, "failed to retrieve history"))?;
    Ok(Json(records))
}

pub async fn reset_history(
    session: AuthSession,
    Extension(svc): Extension<Arc<Service>>,
) -> ApiResult<Json<MessageResponse>> {
    svc.reset_history()
        .await
        .map_err(|e| ApiError::from_domain(&e, "failed to reset history"))?;
    debug!(username = %session.username, "history reset requested");
    Ok(Json(MessageResponse {
        message: "history reset",
    }))
}

/// Body is parsed by hand so a missing or wrong content type is treated
/// like any other malformed body.
fn parse_credentials(body: &[u8]) -> Result<CredentialsRequest, DomainError> {
    serde_json::from_slice(body).map_err(|_| DomainError::InvalidCredentialsFormat)
}

pub async fn register(
    Extension(svc): Extension<Arc<Service>>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let req = parse_credentials(&body)?;
    svc.register(&req.username, &req.password)
        .await
        .map_err(|e| ApiError::from_domain(&e, "failed to register user"))?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "user registered successfully",
        }),
    ))
}

pub async fn login(
    Extension(svc): Extension<Arc<Service>>,
    body: Bytes,
) -> ApiResult<Json<TokenResponse>> {
    let req = parse_credentials(&body)?;
    let token = svc.login(&req.username, &req.password).await?;
    Ok(Json(TokenResponse {
        token: format!("Bearer {token}"),
    }))
}

pub async fn health() -> &'static str {
    "ok"
}
