//! Pure arithmetic. No state, no storage access; callers record history.

use super::error::ArithmeticError;

#[must_use]
pub fn add(a: f64, b: f64) -> f64 {
    a + b
}

#[must_use]
pub fn subtract(a: f64, b: f64) -> f64 {
    a - b
}

#[must_use]
pub fn multiply(a: f64, b: f64) -> f64 {
    a * b
}

/// `a / b`.
///
/// # Errors
/// [`ArithmeticError::DivisionByZero`] when `b` compares equal to zero (including `-0.0`).
pub fn divide(a: f64, b: f64) -> Result<f64, ArithmeticError> {
    if b == 0.0 {
        return Err(ArithmeticError::DivisionByZero);
    }
    Ok(a / b)
}

/// Floating remainder; the sign follows the dividend.
///
/// # Errors
/// [`ArithmeticError::ModuloByZero`] when `b` compares equal to zero.
pub fn modulo(a: f64, b: f64) -> Result<f64, ArithmeticError> {
    if b == 0.0 {
        return Err(ArithmeticError::ModuloByZero);
    }
    // f64 `%` is fmod, not a truncating integer remainder
    Ok(a % b)
}

/// `a ^ b`. NaN for negative bases with fractional exponents is returned as-is.
#[must_use]
pub fn power(a: f64, b: f64) -> f64 {
    a.powf(b)
}
