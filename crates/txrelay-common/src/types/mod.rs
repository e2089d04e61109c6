//! Common types used across TxRelay

use serde::Serialize;
use serde_json::Number;

use crate::error::{RecordError, Result};

/// The outbound shape consumed from the queue.
///
/// Serializes as `{"id": ..., "amount": ..., "merchantName": ...}`. The amount
/// keeps the JSON number it was read from, so `100` is sent as `100` and not
/// `100.0`.
///
/// # Examples
///
/// ```
/// use txrelay_common::CanonicalRecord;
///
/// assert!(CanonicalRecord::new("", 1.into(), "Merchant").is_err());
/// assert!(CanonicalRecord::new("tx-1", 1.into(), "").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    id: String,
    amount: Number,
    merchant_name: String,
}

impl CanonicalRecord {
    /// Build a record, rejecting an empty id, a non-finite amount, or an
    /// empty merchant name.
    pub fn new(
        id: impl Into<String>,
        amount: Number,
        merchant_name: impl Into<String>,
    ) -> Result<Self> {
        let id = id.into();
        let merchant_name = merchant_name.into();

        if id.is_empty() {
            return Err(RecordError::invalid("transaction_id is missing or empty"));
        }

        if !amount.as_f64().is_some_and(f64::is_finite) {
            return Err(RecordError::invalid(format!(
                "amount {} is not a finite number",
                amount
            )));
        }

        if merchant_name.is_empty() {
            return Err(RecordError::invalid("merchant.name is missing or empty"));
        }

        Ok(Self {
            id,
            amount,
            merchant_name,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn amount(&self) -> &Number {
        &self.amount
    }

    pub fn merchant_name(&self) -> &str {
        &self.merchant_name
    }

    /// Encode as the JSON message body sent to the queue
    pub fn to_message_body(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_message_body_uses_camel_case() {
        let record = CanonicalRecord::new("tx-1", Number::from(100), "Merchant A").unwrap();
        assert_eq!(
            record.to_message_body().unwrap(),
            r#"{"id":"tx-1","amount":100,"merchantName":"Merchant A"}"#
        );
    }

    #[test]
    fn test_fractional_amount_preserved() {
        let amount = Number::from_f64(150.25).unwrap();
        let record = CanonicalRecord::new("tx-2", amount, "Example Corp").unwrap();
        let body: serde_json::Value =
            serde_json::from_str(&record.to_message_body().unwrap()).unwrap();

        assert_eq!(body["amount"], serde_json::json!(150.25));
        assert_eq!(body["merchantName"], "Example Corp");
    }

    #[test]
    fn test_rejects_empty_id() {
        let err = CanonicalRecord::new("", Number::from(1), "Merchant").unwrap_err();
        assert!(matches!(err, RecordError::InvalidRecord(_)));
        assert!(err.to_string().contains("transaction_id"));
    }

    #[test]
    fn test_rejects_empty_merchant_name() {
        let err = CanonicalRecord::new("tx-1", Number::from(1), "").unwrap_err();
        assert!(err.to_string().contains("merchant.name"));
    }

    #[test]
    fn test_accessors() {
        let record = CanonicalRecord::new("tx-9", Number::from(-5), "Shop").unwrap();
        assert_eq!(record.id(), "tx-9");
        assert_eq!(record.amount(), &Number::from(-5));
        assert_eq!(record.merchant_name(), "Shop");
    }
}
