//! Transaction schema validation
//!
//! The contract is fixed:
//!
//! | field            | type                        |
//! |------------------|-----------------------------|
//! | `transaction_id` | string                      |
//! | `amount`         | number                      |
//! | `currency`       | string                      |
//! | `timestamp`      | string, RFC 3339 date-time  |
//! | `merchant`       | object                      |
//! | `merchant.id`    | string                      |
//! | `merchant.name`  | string                      |
//!
//! Extra properties are allowed. Validation walks the whole record and
//! reports every violation, not just the first.

use serde_json::{Map, Value};
use std::fmt;

use super::record::{ParsedRecord, ValidatedRecord};
use crate::error::SchemaViolation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldType {
    String,
    Number,
    DateTime,
    Object,
}

const TRANSACTION_FIELDS: &[(&str, FieldType)] = &[
    ("transaction_id", FieldType::String),
    ("amount", FieldType::Number),
    ("currency", FieldType::String),
    ("timestamp", FieldType::DateTime),
    ("merchant", FieldType::Object),
];

const MERCHANT_FIELDS: &[(&str, FieldType)] =
    &[("id", FieldType::String), ("name", FieldType::String)];

/// One schema violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// JSON pointer to the offending value, e.g. `/merchant/name`
    pub path: String,
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    Missing,
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
    InvalidFormat {
        format: &'static str,
    },
}

impl Diagnostic {
    fn new(path: String, kind: DiagnosticKind) -> Self {
        Self { path, kind }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        match &self.kind {
            DiagnosticKind::Missing => write!(f, "{} is required", path),
            DiagnosticKind::WrongType { expected, found } => {
                write!(f, "{} must be {}, found {}", path, expected, found)
            },
            DiagnosticKind::InvalidFormat { format } => {
                write!(f, "{} must match format \"{}\"", path, format)
            },
        }
    }
}

/// Check `parsed` against the transaction schema.
///
/// Returns the validated record, or every violation found.
pub fn validate(parsed: ParsedRecord) -> Result<ValidatedRecord, SchemaViolation> {
    let diagnostics = check(parsed.as_value());
    if diagnostics.is_empty() {
        Ok(ValidatedRecord::new(parsed.into_value()))
    } else {
        Err(SchemaViolation { diagnostics })
    }
}

/// Collect every schema violation in `value`. Empty means valid.
pub fn check(value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    match value.as_object() {
        Some(object) => check_fields(object, TRANSACTION_FIELDS, "", &mut diagnostics),
        None => diagnostics.push(Diagnostic::new(
            String::new(),
            DiagnosticKind::WrongType {
                expected: "object",
                found: type_name(value),
            },
        )),
    }

    diagnostics
}

fn check_fields(
    object: &Map<String, Value>,
    fields: &[(&str, FieldType)],
    base: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for &(name, field_type) in fields {
        let path = format!("{}/{}", base, name);

        let Some(value) = object.get(name) else {
            diagnostics.push(Diagnostic::new(path, DiagnosticKind::Missing));
            continue;
        };

        match field_type {
            FieldType::String => expect_type(value, "string", Value::is_string, path, diagnostics),
            FieldType::Number => expect_type(value, "number", Value::is_number, path, diagnostics),
            FieldType::DateTime => match value.as_str() {
                Some(text) if is_date_time(text) => {},
                Some(_) => diagnostics.push(Diagnostic::new(
                    path,
                    DiagnosticKind::InvalidFormat {
                        format: "date-time",
                    },
                )),
                None => expect_type(value, "string", Value::is_string, path, diagnostics),
            },
            FieldType::Object => match value.as_object() {
                // Only merchant is an object field
                Some(nested) => check_fields(nested, MERCHANT_FIELDS, &path, diagnostics),
                None => expect_type(value, "object", Value::is_object, path, diagnostics),
            },
        }
    }
}

fn expect_type(
    value: &Value,
    expected: &'static str,
    matches: fn(&Value) -> bool,
    path: String,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if !matches(value) {
        diagnostics.push(Diagnostic::new(
            path,
            DiagnosticKind::WrongType {
                expected,
                found: type_name(value),
            },
        ));
    }
}

fn is_date_time(text: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(text).is_ok()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
