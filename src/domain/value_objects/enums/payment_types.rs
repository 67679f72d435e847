use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Installment,
    Full,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Installment => "installment",
            PaymentType::Full => "full",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "installment" => Some(PaymentType::Installment),
            "full" => Some(PaymentType::Full),
            _ => None,
        }
    }
}

impl Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
