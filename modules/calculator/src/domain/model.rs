//! Records owned by the history and credential stores.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::engine;
use super::error::ArithmeticError;

/// Binary arithmetic operation.
///
/// Serialized with its persisted name (`"Add"`, `"Divide"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Add,
        Operation::Subtract,
        Operation::Multiply,
        Operation::Divide,
        Operation::Modulo,
        Operation::Power,
    ];

    /// Name stored in the `operation` field of a record.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Add => "Add",
            Operation::Subtract => "Subtract",
            Operation::Multiply => "Multiply",
            Operation::Divide => "Divide",
            Operation::Modulo => "Modulo",
            Operation::Power => "Power",
        }
    }

    /// Lowercase path segment the operation is served under.
    #[must_use]
    pub fn route_segment(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
            Operation::Modulo => "modulo",
            Operation::Power => "power",
        }
    }

    /// Compute `a <op> b`.
    ///
    /// # Errors
    /// Returns [`ArithmeticError`] for division or modulo by zero.
    pub fn apply(self, a: f64, b: f64) -> Result<f64, ArithmeticError> {
        match self {
            Operation::Add => Ok(engine::add(a, b)),
            Operation::Subtract => Ok(engine::subtract(a, b)),
            Operation::Multiply => Ok(engine::multiply(a, b)),
            Operation::Divide => engine::divide(a, b),
            Operation::Modulo => engine::modulo(a, b),
            Operation::Power => Ok(engine::power(a, b)),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation '{0}'")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnknownOperation(s.to_owned()))
    }
}

/// One logged computation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub operand1: f64,
    pub operand2: f64,
    pub operation: Operation,
    pub result: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl OperationRecord {
    #[must_use]
    pub fn new(
        operation: Operation,
        operand1: f64,
        operand2: f64,
        result: f64,
        timestamp: OffsetDateTime,
    ) -> Self {
        Self {
            operand1,
            operand2,
            operation,
            result,
            timestamp,
        }
    }
}

/// Stored credential. The password is only ever kept as a hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub username: String,
    pub password_hash: String,
}
