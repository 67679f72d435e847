use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::payment_sessions::{NewPaymentSessionEntity, PaymentSessionEntity},
        repositories::payment_sessions::PaymentSessionRepository,
        value_objects::enums::session_statuses::SessionStatus,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::payment_sessions},
};

pub struct PaymentSessionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentSessionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentSessionRepository for PaymentSessionPostgres {
    async fn insert(&self, session: NewPaymentSessionEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let session_id = insert_into(payment_sessions::table)
            .values(&session)
            .returning(payment_sessions::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(session_id)
    }

    async fn find_by_id(&self, session_id: Uuid) -> Result<Option<PaymentSessionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let session = payment_sessions::table
            .filter(payment_sessions::id.eq(session_id))
            .select(PaymentSessionEntity::as_select())
            .first::<PaymentSessionEntity>(&mut conn)
            .optional()?;

        Ok(session)
    }

    async fn mark_completed(&self, session_id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(payment_sessions::table)
            .filter(payment_sessions::id.eq(session_id))
            .set(payment_sessions::status.eq(SessionStatus::Completed.to_string()))
            .execute(&mut conn)?;

        Ok(())
    }
}
