//! Maps a validated transaction into the canonical outbound record.
//!
//! The transformer re-checks the three fields it reads instead of trusting the
//! validator, so a record that slipped through with the wrong shape is
//! rejected here rather than published.

use serde_json::Value;
use txrelay_common::{CanonicalRecord, RecordError};

use super::record::ValidatedRecord;

pub fn transform(record: &ValidatedRecord) -> Result<CanonicalRecord, RecordError> {
    transform_value(record.as_value())
}

/// Build a canonical record from any JSON value.
///
/// Fails when `transaction_id` is missing or empty, `amount` is not a finite
/// number, or `merchant.name` is missing or empty.
pub fn transform_value(value: &Value) -> Result<CanonicalRecord, RecordError> {
    let id = value
        .get("transaction_id")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let amount = match value.get("amount") {
        Some(Value::Number(amount)) => amount.clone(),
        Some(other) => {
            return Err(RecordError::invalid(format!("amount is not numeric: {}", other)))
        },
        None => return Err(RecordError::invalid("amount is missing")),
    };

    let merchant_name = value
        .get("merchant")
        .and_then(|merchant| merchant.get("name"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    CanonicalRecord::new(id, amount, merchant_name)
}
