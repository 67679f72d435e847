use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, prelude::*, update};
use std::sync::Arc;

use crate::{
    domain::{
        entities::customers::CustomerEntity, repositories::customers::CustomerRepository,
        value_objects::enums::customer_plans::CustomerPlan,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::customers},
};

pub struct CustomerPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CustomerPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CustomerRepository for CustomerPostgres {
    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<CustomerEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let customer = customers::table
            .filter(customers::user_id.eq(user_id))
            .select(CustomerEntity::as_select())
            .first::<CustomerEntity>(&mut conn)
            .optional()?;

        Ok(customer)
    }

    async fn set_stripe_customer_id(&self, user_id: &str, stripe_customer_id: &str) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(customers::table)
            .filter(customers::user_id.eq(user_id))
            .set(customers::stripe_customer_id.eq(stripe_customer_id))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn set_plan(&self, user_id: &str, plan: CustomerPlan) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(customers::table)
            .filter(customers::user_id.eq(user_id))
            .set(customers::plan.eq(plan.to_string()))
            .execute(&mut conn)?;

        Ok(())
    }
}
