//! Conversion between records and Firestore's typed field values.
//!
//! Firestore wraps every field in a one-key object naming its type,
//! e.g. `{"doubleValue": 1.5}`. Non-finite doubles travel as the strings
//! `"NaN"`, `"Infinity"` and `"-Infinity"`.

use serde_json::{Map, Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::domain::model::{CredentialRecord, Operation, OperationRecord};

pub(super) const OPERAND1: &str = "operand1";
pub(super) const OPERAND2: &str = "operand2";
pub(super) const OPERATION: &str = "operation";
pub(super) const RESULT: &str = "result";
pub(super) const TIMESTAMP: &str = "timestamp";
pub(super) const USERNAME: &str = "username";
pub(super) const PASSWORD: &str = "password";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("missing field '{0}'")]
    Missing(&'static str),

    #[error("field '{0}' has the wrong type")]
    WrongType(&'static str),

    #[error("field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn double(v: f64) -> Value {
    if v.is_nan() {
        json!({ "doubleValue": "NaN" })
    } else if v.is_infinite() {
        let s = if v > 0.0 { "Infinity" } else { "-Infinity" };
        json!({ "doubleValue": s })
    } else {
        json!({ "doubleValue": v })
    }
}

fn string(s: &str) -> Value {
    json!({ "stringValue": s })
}

pub(super) fn encode_record(record: &OperationRecord) -> Result<Map<String, Value>, DecodeError> {
    let timestamp = record
        .timestamp
        .format(&Rfc3339)
        .map_err(|e| DecodeError::Invalid {
            field: TIMESTAMP,
            reason: e.to_string(),
        })?;

    let mut fields = Map::new();
    fields.insert(OPERAND1.to_owned(), double(record.operand1));
    fields.insert(OPERAND2.to_owned(), double(record.operand2));
    fields.insert(OPERATION.to_owned(), string(record.operation.as_str()));
    fields.insert(RESULT.to_owned(), double(record.result));
    fields.insert(TIMESTAMP.to_owned(), json!({ "timestampValue": timestamp }));
    Ok(fields)
}

pub(super) fn encode_credential(record: &CredentialRecord) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert(USERNAME.to_owned(), string(&record.username));
    fields.insert(PASSWORD.to_owned(), string(&record.password_hash));
    fields
}

fn field<'a>(fields: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value, DecodeError> {
    fields.get(name).ok_or(DecodeError::Missing(name))
}

#[allow(clippy::cast_precision_loss)]
fn decode_double(fields: &Map<String, Value>, name: &'static str) -> Result<f64, DecodeError> {
    let value = field(fields, name)?;

    if let Some(v) = value.get("doubleValue") {
        return match v {
            Value::Number(n) => n.as_f64().ok_or(DecodeError::WrongType(name)),
            Value::String(s) => match s.as_str() {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                _ => Err(DecodeError::WrongType(name)),
            },
            _ => Err(DecodeError::WrongType(name)),
        };
    }

    // Whole numbers written by other clients may be stored as integers
    if let Some(v) = value.get("integerValue") {
        let parsed = match v {
            Value::String(s) => s.parse::<i64>().ok(),
            Value::Number(n) => n.as_i64(),
            _ => None,
        };
        return parsed.map(|i| i as f64).ok_or(DecodeError::WrongType(name));
    }

    Err(DecodeError::WrongType(name))
}

fn decode_string<'a>(
    fields: &'a Map<String, Value>,
    name: &'static str,
) -> Result<&'a str, DecodeError> {
    field(fields, name)?
        .get("stringValue")
        .and_then(Value::as_str)
        .ok_or(DecodeError::WrongType(name))
}

pub(super) fn decode_record(fields: &Map<String, Value>) -> Result<OperationRecord, DecodeError> {
    let operation = decode_string(fields, OPERATION)?
        .parse::<Operation>()
        .map_err(|e| DecodeError::Invalid {
            field: OPERATION,
            reason: e.to_string(),
        })?;

    let raw_ts = field(fields, TIMESTAMP)?
        .get("timestampValue")
        .and_then(Value::as_str)
        .ok_or(DecodeError::WrongType(TIMESTAMP))?;
    let timestamp = OffsetDateTime::parse(raw_ts, &Rfc3339).map_err(|e| DecodeError::Invalid {
        field: TIMESTAMP,
        reason: e.to_string(),
    })?;

    Ok(OperationRecord::new(
        operation,
        decode_double(fields, OPERAND1)?,
        decode_double(fields, OPERAND2)?,
        decode_double(fields, RESULT)?,
        timestamp,
    ))
}

pub(super) fn decode_password_hash(fields: &Map<String, Value>) -> Result<String, DecodeError> {
    decode_string(fields, PASSWORD).map(str::to_owned)
}
