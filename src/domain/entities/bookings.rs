use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::bookings;

/// Booking row, consumed by payment orchestration. Amounts are minor
/// currency units. The orchestrator only mutates the payment-progress
/// fields, never the booking itself.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = bookings)]
pub struct BookingEntity {
    pub id: Uuid,
    pub user_id: String,
    pub total_amount_minor: i64,
    pub installment_amount_minor: i64,
    pub remaining_amount_minor: i64,
    pub installments_remaining: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
