//! Per-object record stages
//!
//! `RawObject -> ParsedRecord -> ValidatedRecord -> CanonicalRecord`. Each
//! stage is a new value; nothing is mutated in place.

use serde_json::Value;

use crate::error::ProcessError;

/// Bytes fetched from the store for one key
#[derive(Debug, Clone)]
pub struct RawObject {
    pub key: String,
    pub body: Vec<u8>,
}

impl RawObject {
    pub fn new(key: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            body,
        }
    }

    /// Decode the body as UTF-8 and parse it as JSON
    pub fn parse(self) -> Result<ParsedRecord, ProcessError> {
        let text = String::from_utf8(self.body)?;
        let value = serde_json::from_str(&text)?;
        Ok(ParsedRecord(value))
    }
}

/// Untyped JSON tree decoded from a [`RawObject`]
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord(Value);

impl ParsedRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub(crate) fn into_value(self) -> Value {
        self.0
    }
}

/// A [`ParsedRecord`] that passed schema validation.
///
/// Only [`super::validator::validate`] builds one.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecord(Value);

impl ValidatedRecord {
    pub(crate) fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}
