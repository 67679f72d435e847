use std::collections::HashMap;

/// Subscription plan identifiers accepted by the public API.
pub const GOLDEN_MONTHLY_PLAN_ID: &str = "golden_monthly";
pub const GOLDEN_YEARLY_PLAN_ID: &str = "golden_yearly";

/// Static mapping from plan identifiers to gateway price identifiers.
/// Built once from configuration; unknown plans never reach the gateway.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    prices: HashMap<String, String>,
}

impl PlanCatalog {
    pub fn new(golden_monthly_price: String, golden_yearly_price: String) -> Self {
        let prices = HashMap::from([
            (GOLDEN_MONTHLY_PLAN_ID.to_string(), golden_monthly_price),
            (GOLDEN_YEARLY_PLAN_ID.to_string(), golden_yearly_price),
        ]);

        Self { prices }
    }

    pub fn resolve_price_id(&self, plan_id: &str) -> Option<&str> {
        self.prices.get(plan_id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> PlanCatalog {
        PlanCatalog::new("price_monthly_123".to_string(), "price_yearly_456".to_string())
    }

    #[test]
    fn resolves_known_plans() {
        assert_eq!(
            catalog().resolve_price_id(GOLDEN_MONTHLY_PLAN_ID),
            Some("price_monthly_123")
        );
        assert_eq!(
            catalog().resolve_price_id(GOLDEN_YEARLY_PLAN_ID),
            Some("price_yearly_456")
        );
    }

    #[test]
    fn unknown_plans_resolve_to_none() {
        assert_eq!(catalog().resolve_price_id("not_a_real_plan"), None);
    }
}
