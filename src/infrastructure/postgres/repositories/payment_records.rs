use anyhow::Result;
use async_trait::async_trait;
use diesel::{PgConnection, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::payment_records::{NewPaymentRecordEntity, PaymentRecordEntity},
        repositories::payment_records::{PaymentRecordInsert, PaymentRecordRepository},
        value_objects::enums::payment_record_statuses::PaymentRecordStatus,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::payment_records},
};

pub struct PaymentRecordPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentRecordPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }

    fn read_existing_by_intent(
        &self,
        conn: &mut PgConnection,
        record: &NewPaymentRecordEntity,
    ) -> Result<PaymentRecordInsert> {
        let existing = payment_records::table
            .filter(payment_records::payment_intent_id.eq(&record.payment_intent_id))
            .select(PaymentRecordEntity::as_select())
            .first::<PaymentRecordEntity>(conn)
            .optional()?;

        // A missing row means the violation was not on payment_intent_id
        // (e.g. an unnamed driver-side constraint report for the receipt
        // index), so ask for a fresh receipt.
        Ok(match existing {
            Some(winner) => PaymentRecordInsert::Existing(winner),
            None => PaymentRecordInsert::ReceiptCollision,
        })
    }
}

#[async_trait]
impl PaymentRecordRepository for PaymentRecordPostgres {
    async fn find_by_payment_intent_id(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<PaymentRecordEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let record = payment_records::table
            .filter(payment_records::payment_intent_id.eq(payment_intent_id))
            .select(PaymentRecordEntity::as_select())
            .first::<PaymentRecordEntity>(&mut conn)
            .optional()?;

        Ok(record)
    }

    async fn find_by_receipt_number(
        &self,
        receipt_number: &str,
    ) -> Result<Option<PaymentRecordEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let record = payment_records::table
            .filter(payment_records::receipt_number.eq(receipt_number))
            .select(PaymentRecordEntity::as_select())
            .first::<PaymentRecordEntity>(&mut conn)
            .optional()?;

        Ok(record)
    }

    async fn find_by_booking_id(&self, booking_id: Uuid) -> Result<Vec<PaymentRecordEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let records = payment_records::table
            .filter(payment_records::booking_id.eq(booking_id))
            .order(payment_records::payment_date.asc())
            .select(PaymentRecordEntity::as_select())
            .load::<PaymentRecordEntity>(&mut conn)?;

        Ok(records)
    }

    async fn receipt_number_exists(&self, receipt_number: &str) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let existing = payment_records::table
            .filter(payment_records::receipt_number.eq(receipt_number))
            .select(payment_records::id)
            .first::<Uuid>(&mut conn)
            .optional()?;

        Ok(existing.is_some())
    }

    async fn insert(&self, record: NewPaymentRecordEntity) -> Result<PaymentRecordInsert> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let inserted = insert_into(payment_records::table)
            .values(&record)
            .returning(PaymentRecordEntity::as_returning())
            .get_result::<PaymentRecordEntity>(&mut conn);

        match inserted {
            Ok(stored) => Ok(PaymentRecordInsert::Created(stored)),
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                info,
            )) => {
                // Two unique indexes can fire here. A payment_intent_id race
                // converges on the winning row; a receipt_number collision
                // needs a fresh receipt instead.
                match info.constraint_name() {
                    Some(constraint) if constraint.contains("receipt_number") => {
                        Ok(PaymentRecordInsert::ReceiptCollision)
                    }
                    _ => self.read_existing_by_intent(&mut conn, &record),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn mark_refunded(&self, id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(payment_records::table)
            .filter(payment_records::id.eq(id))
            .set(payment_records::status.eq(PaymentRecordStatus::Refunded.to_string()))
            .execute(&mut conn)?;

        Ok(())
    }
}
