use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::payment_records::{NewPaymentRecordEntity, PaymentRecordEntity};

/// Result of an idempotent ledger insert. A unique violation on
/// `payment_intent_id` resolves to the row that won; a violation on
/// `receipt_number` asks the caller to retry with a fresh receipt.
#[derive(Debug, Clone)]
pub enum PaymentRecordInsert {
    Created(PaymentRecordEntity),
    Existing(PaymentRecordEntity),
    ReceiptCollision,
}

#[async_trait]
#[automock]
pub trait PaymentRecordRepository {
    async fn find_by_payment_intent_id(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<PaymentRecordEntity>>;

    async fn find_by_receipt_number(
        &self,
        receipt_number: &str,
    ) -> Result<Option<PaymentRecordEntity>>;

    async fn find_by_booking_id(&self, booking_id: Uuid) -> Result<Vec<PaymentRecordEntity>>;

    async fn receipt_number_exists(&self, receipt_number: &str) -> Result<bool>;

    async fn insert(&self, record: NewPaymentRecordEntity) -> Result<PaymentRecordInsert>;

    async fn mark_refunded(&self, id: Uuid) -> Result<()>;
}
