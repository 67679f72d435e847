use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::payment_records;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payment_records)]
pub struct PaymentRecordEntity {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount_minor: i64,
    pub payment_date: DateTime<Utc>,
    pub payment_type: String,
    pub payment_intent_id: String,
    pub receipt_number: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payment_records)]
pub struct NewPaymentRecordEntity {
    pub booking_id: Uuid,
    pub amount_minor: i64,
    pub payment_date: DateTime<Utc>,
    pub payment_type: String,
    pub payment_intent_id: String,
    pub receipt_number: String,
    pub status: String,
}
