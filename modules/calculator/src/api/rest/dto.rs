use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// `?operand1=<float>&operand2=<float>`, kept as raw strings so that any
/// parse failure maps to one error.
#[derive(Debug, Default)]
pub struct OperandsQuery {
    pub operand1: Option<String>,
    pub operand2: Option<String>,
}

impl OperandsQuery {
    /// Collect the operands from decoded query pairs. A repeated key keeps
    /// its first value; unknown keys are ignored.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "operand1" => &mut query.operand1,
                "operand2" => &mut query.operand2,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }

    /// # Errors
    /// [`DomainError::InvalidOperands`] if either operand is missing or not a float.
    pub fn parse(&self) -> Result<(f64, f64), DomainError> {
        let parse = |raw: Option<&String>| {
            raw.and_then(|s| s.parse::<f64>().ok())
                .ok_or(DomainError::InvalidOperands)
        };
        Ok((parse(self.operand1.as_ref())?, parse(self.operand2.as_ref())?))
    }
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub result: f64,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
