use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Loyalty tier on the customer record. Upgrading is a SET: applying the same
/// tier twice leaves the record unchanged.
#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CustomerPlan {
    #[default]
    Standard,
    Golden,
}

impl CustomerPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerPlan::Standard => "standard",
            CustomerPlan::Golden => "golden",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "golden" => CustomerPlan::Golden,
            _ => CustomerPlan::Standard,
        }
    }

    /// Tier granted by a subscription plan identifier.
    pub fn for_plan_id(plan_id: &str) -> Self {
        if plan_id.starts_with("golden") {
            CustomerPlan::Golden
        } else {
            CustomerPlan::Standard
        }
    }
}

impl Display for CustomerPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
