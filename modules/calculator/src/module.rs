use std::sync::Arc;

use anyhow::Context as _;
use axum::Router;
use calc_auth::{SessionConfig, SessionVerifier, session_pair};
use tracing::info;

use crate::api::rest::router;
use crate::config::CalculatorConfig;
use crate::domain::service::Service;
use crate::infra::storage::build_stores;

/// Assembled calculator: stores, service and session gate.
pub struct CalculatorModule {
    service: Arc<Service>,
    verifier: Arc<SessionVerifier>,
}

impl CalculatorModule {
    /// Build stores and session keys from configuration.
    ///
    /// # Errors
    /// Fails if the session settings are invalid or a store cannot be built.
    pub fn init(cfg: &CalculatorConfig, auth: &SessionConfig) -> anyhow::Result<Self> {
        info!("Initializing calculator module");

        let (issuer, verifier) = session_pair(auth).context("invalid auth configuration")?;
        let stores = build_stores(cfg).context("failed to initialize storage")?;
        let service = Service::new(stores.history, stores.credentials, issuer);

        info!("Calculator module initialized");
        Ok(Self {
            service: Arc::new(service),
            verifier: Arc::new(verifier),
        })
    }

    #[must_use]
    pub fn router(&self) -> Router {
        router(self.service.clone(), self.verifier.clone())
    }
}
