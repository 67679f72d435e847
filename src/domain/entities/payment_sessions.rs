use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::payment_sessions;

/// Tracks a subscription checkout from creation until the success callback
/// confirms it.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payment_sessions)]
pub struct PaymentSessionEntity {
    pub id: Uuid,
    pub user_id: String,
    pub subscription_id: String,
    pub plan_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payment_sessions)]
pub struct NewPaymentSessionEntity {
    pub user_id: String,
    pub subscription_id: String,
    pub plan_id: String,
    pub status: String,
}
