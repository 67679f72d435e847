use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::payment_sessions::{NewPaymentSessionEntity, PaymentSessionEntity};

#[async_trait]
#[automock]
pub trait PaymentSessionRepository {
    async fn insert(&self, session: NewPaymentSessionEntity) -> Result<Uuid>;

    async fn find_by_id(&self, session_id: Uuid) -> Result<Option<PaymentSessionEntity>>;

    /// Idempotent: completing an already-completed session is a no-op.
    async fn mark_completed(&self, session_id: Uuid) -> Result<()>;
}
