use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::bookings::BookingEntity;

#[async_trait]
#[automock]
pub trait BookingRepository {
    async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<BookingEntity>>;

    /// Reduces the outstanding balance after a recorded payment. A full
    /// payment clears the balance; an installment also decrements the
    /// installment counter.
    async fn apply_payment(&self, booking_id: Uuid, amount_minor: i64) -> Result<()>;
}
