use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Lifecycle of a ledger record. Refunds mark the record instead of deleting
/// it so the payment history survives reconciliation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentRecordStatus {
    Active,
    Refunded,
}

impl PaymentRecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentRecordStatus::Active => "active",
            PaymentRecordStatus::Refunded => "refunded",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "refunded" => PaymentRecordStatus::Refunded,
            _ => PaymentRecordStatus::Active,
        }
    }
}

impl Display for PaymentRecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
