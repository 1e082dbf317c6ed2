// payments.rs — In-memory demo payments adapter.
//
// Two actions: create (amount + currency + vendor_id, optional memo) and
// refund (payment_id of a previously created payment, optional reason).
// State lives in process memory; this adapter exists so the gateway has a
// real dispatch target, not as a payments system.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{json, Value};
use uuid::Uuid;

use super::{require_present, require_str, ToolAdapter};
use crate::error::AdapterError;

/// Demo payments backend.
#[derive(Default)]
pub struct PaymentsAdapter {
    payments: Mutex<HashMap<String, Value>>,
    refunds: Mutex<HashMap<String, Value>>,
}

impl PaymentsAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn create(&self, params: &Value) -> Result<Value, AdapterError> {
        let amount = require_present(params, "amount")?.clone();
        let currency = require_present(params, "currency")?.clone();
        let vendor_id = require_present(params, "vendor_id")?.clone();

        let payment_id = Uuid::new_v4().to_string();
        let mut payment = json!({
            "payment_id": payment_id,
            "amount": amount,
            "currency": currency,
            "vendor_id": vendor_id,
            "status": "created",
        });
        if let Some(memo) = params.get("memo") {
            payment["memo"] = memo.clone();
        }

        self.payments
            .lock()
            .expect("payments lock")
            .insert(payment_id, payment.clone());
        Ok(payment)
    }

    fn refund(&self, params: &Value) -> Result<Value, AdapterError> {
        let payment_id = require_str(params, "payment_id")?;
        if !self
            .payments
            .lock()
            .expect("payments lock")
            .contains_key(payment_id)
        {
            return Err(AdapterError::NotFound {
                entity: "payment",
                id: payment_id.to_string(),
            });
        }

        let refund_id = Uuid::new_v4().to_string();
        let mut refund = json!({
            "refund_id": refund_id,
            "payment_id": payment_id,
            "status": "refunded",
        });
        if let Some(reason) = params.get("reason") {
            refund["reason"] = reason.clone();
        }

        self.refunds
            .lock()
            .expect("refunds lock")
            .insert(refund_id, refund.clone());
        Ok(refund)
    }
}

impl ToolAdapter for PaymentsAdapter {
    fn tool(&self) -> &'static str {
        "payments"
    }

    fn supports(&self, action: &str) -> bool {
        matches!(action, "create" | "refund")
    }

    fn invoke(&self, action: &str, params: &Value) -> Result<Value, AdapterError> {
        match action {
            "create" => self.create(params),
            "refund" => self.refund(params),
            other => Err(AdapterError::UnsupportedAction {
                action: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_returns_payment_with_id() {
        let adapter = PaymentsAdapter::new();
        let result = adapter
            .invoke(
                "create",
                &json!({"amount": 500, "currency": "USD", "vendor_id": "A", "memo": "invoice 7"}),
            )
            .unwrap();

        assert_eq!(result["status"], "created");
        assert_eq!(result["amount"], 500);
        assert_eq!(result["memo"], "invoice 7");
        assert!(result["payment_id"].as_str().is_some());
    }

    #[test]
    fn create_requires_each_field() {
        let adapter = PaymentsAdapter::new();
        for missing in ["amount", "currency", "vendor_id"] {
            let mut params = json!({"amount": 1, "currency": "USD", "vendor_id": "A"});
            params.as_object_mut().unwrap().remove(missing);
            let err = adapter.invoke("create", &params).unwrap_err();
            assert!(matches!(err, AdapterError::MissingField { field } if field == missing));
        }
    }

    #[test]
    fn refund_of_created_payment_succeeds() {
        let adapter = PaymentsAdapter::new();
        let payment = adapter
            .invoke(
                "create",
                &json!({"amount": 10, "currency": "EUR", "vendor_id": "B"}),
            )
            .unwrap();
        let payment_id = payment["payment_id"].as_str().unwrap();

        let refund = adapter
            .invoke("refund", &json!({"payment_id": payment_id, "reason": "dup"}))
            .unwrap();
        assert_eq!(refund["status"], "refunded");
        assert_eq!(refund["payment_id"], payment_id);
        assert_eq!(refund["reason"], "dup");
    }

    #[test]
    fn refund_of_unknown_payment_fails() {
        let adapter = PaymentsAdapter::new();
        let err = adapter
            .invoke("refund", &json!({"payment_id": "nope"}))
            .unwrap_err();
        assert!(matches!(err, AdapterError::NotFound { .. }));
    }
}
