use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::customers;

/// Customer record keyed by the external identity provider's user id.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = customers)]
pub struct CustomerEntity {
    pub id: Uuid,
    pub user_id: String,
    pub email: String,
    pub stripe_customer_id: Option<String>,
    pub plan: String,
    pub created_at: DateTime<Utc>,
}
