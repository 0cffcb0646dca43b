//! Calculator Module
//!
//! Arithmetic over HTTP with an audited, resettable history and a
//! session-token gate in front of every computation.
//!
//! ## Architecture
//!
//! - `domain/engine.rs` - pure arithmetic operations
//! - `domain/repo.rs` - history and credential store contracts
//! - `domain/service.rs` - composes engine, stores and session issuer
//! - `infra/storage` - in-memory and Firestore backends
//! - `api/rest` - routes, handlers and HTTP error mapping
//! - `module.rs` - wires configuration into a ready router

pub mod config;
pub use config::{CalculatorConfig, PasswordHashConfig, StorageConfig};

pub mod domain;
pub use domain::model::{Operation, OperationRecord};
pub use domain::service::Service;

pub mod api;
pub mod infra;

mod module;
pub use module::CalculatorModule;
