use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Extension, Query};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use calc_auth::axum_ext::{AuthSession, require_session};
use calc_auth::SessionVerifier;

use crate::api::rest::handlers;
use crate::domain::model::Operation;
use crate::domain::service::Service;

/// Build the calculator router.
///
/// Operation and history routes sit behind the bearer-token gate;
/// `/login`, `/register` and `/health` are public.
#[must_use]
pub fn router(service: Arc<Service>, verifier: Arc<SessionVerifier>) -> Router {
    let mut protected = Router::new();
    for operation in Operation::ALL {
        protected = protected.route(
            &format!("/{}", operation.route_segment()),
            get(
                move |session: AuthSession,
                      svc: Extension<Arc<Service>>,
                      query: Result<Query<Vec<(String, String)>>, QueryRejection>| {
                    handlers::calculate(operation, session, svc, query)
                },
            ),
        );
    }

    let protected = protected
        .route("/history", get(handlers::history))
        .route("/history/reset", post(handlers::reset_history))
        .route_layer(from_fn_with_state(verifier, require_session));

    let public = Router::new()
        .route("/login", post(handlers::login))
        .route("/register", post(handlers::register))
        .route("/health", get(handlers::health));

    protected.merge(public).layer(Extension(service))
}
