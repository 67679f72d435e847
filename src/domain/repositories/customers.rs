use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::{
    entities::customers::CustomerEntity, value_objects::enums::customer_plans::CustomerPlan,
};

#[async_trait]
#[automock]
pub trait CustomerRepository {
    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<CustomerEntity>>;

    async fn set_stripe_customer_id(&self, user_id: &str, stripe_customer_id: &str) -> Result<()>;

    /// Upgrading is a SET; running it twice leaves the same plan.
    async fn set_plan(&self, user_id: &str, plan: CustomerPlan) -> Result<()>;
}
