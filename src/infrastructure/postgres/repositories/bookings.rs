use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{entities::bookings::BookingEntity, repositories::bookings::BookingRepository},
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::bookings},
};

pub struct BookingPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl BookingPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl BookingRepository for BookingPostgres {
    async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let booking = bookings::table
            .filter(bookings::id.eq(booking_id))
            .select(BookingEntity::as_select())
            .first::<BookingEntity>(&mut conn)
            .optional()?;

        Ok(booking)
    }

    async fn apply_payment(&self, booking_id: Uuid, amount_minor: i64) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let booking = bookings::table
            .filter(bookings::id.eq(booking_id))
            .select(BookingEntity::as_select())
            .first::<BookingEntity>(&mut conn)?;

        let remaining = (booking.remaining_amount_minor - amount_minor).max(0);
        let installments = (booking.installments_remaining - 1).max(0);

        update(bookings::table)
            .filter(bookings::id.eq(booking_id))
            .set((
                bookings::remaining_amount_minor.eq(remaining),
                bookings::installments_remaining.eq(installments),
            ))
            .execute(&mut conn)?;

        Ok(())
    }
}
