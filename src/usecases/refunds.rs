use std::sync::Arc;

use futures::future::try_join_all;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    domain::{
        entities::payment_records::PaymentRecordEntity,
        repositories::payment_records::PaymentRecordRepository,
        value_objects::enums::payment_record_statuses::PaymentRecordStatus,
    },
    usecases::gateway::StripeGateway,
};

#[derive(Debug, Error)]
pub enum RefundError {
    #[error("payment record not found")]
    RecordNotFound,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl RefundError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            RefundError::RecordNotFound => StatusCode::NOT_FOUND,
            RefundError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type RefundResult<T> = std::result::Result<T, RefundError>;

#[derive(Debug, Clone)]
pub struct RefundDto {
    pub receipt_number: String,
    pub refund_id: Option<String>,
    pub amount_minor: i64,
}

/// Booking-level refunds distinguish "nothing to refund" from failure: a
/// cancellation flow must treat an unpaid booking as success.
#[derive(Debug, Clone)]
pub enum BookingRefundOutcome {
    NoPaymentFound,
    Refunded {
        refunds: Vec<RefundDto>,
        total_refunded_minor: i64,
    },
}

#[derive(Debug, Clone)]
pub struct ReceiptRefundDto {
    pub receipt_number: String,
    pub refund_id: Option<String>,
    pub amount_minor: i64,
    pub already_refunded: bool,
}

pub struct RefundUseCase<P, Stripe>
where
    P: PaymentRecordRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    payment_record_repo: Arc<P>,
    stripe_client: Arc<Stripe>,
}

impl<P, Stripe> RefundUseCase<P, Stripe>
where
    P: PaymentRecordRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    pub fn new(payment_record_repo: Arc<P>, stripe_client: Arc<Stripe>) -> Self {
        Self {
            payment_record_repo,
            stripe_client,
        }
    }

    /// Refunds a single recorded payment by receipt number. Already-refunded
    /// records return their stored state without another gateway call, so the
    /// operation is safe to re-run after a crash between the refund and the
    /// ledger patch.
    pub async fn refund_payment(&self, receipt_number: &str) -> RefundResult<ReceiptRefundDto> {
        let record = self
            .payment_record_repo
            .find_by_receipt_number(receipt_number)
            .await
            .map_err(|err| {
                error!(
                    receipt_number,
                    db_error = ?err,
                    "refunds: failed to look up payment record"
                );
                RefundError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(receipt_number, "refunds: no payment record for receipt");
                RefundError::RecordNotFound
            })?;

        if PaymentRecordStatus::from_str(&record.status) == PaymentRecordStatus::Refunded {
            info!(
                receipt_number,
                payment_id = %record.id,
                "refunds: record already refunded, skipping gateway call"
            );
            return Ok(ReceiptRefundDto {
                receipt_number: record.receipt_number,
                refund_id: None,
                amount_minor: record.amount_minor,
                already_refunded: true,
            });
        }

        let refund = self
            .stripe_client
            .refund_payment_intent(&record.payment_intent_id)
            .await
            .map_err(|err| {
                error!(
                    receipt_number,
                    payment_intent_id = %record.payment_intent_id,
                    error = ?err,
                    "refunds: gateway refund failed"
                );
                RefundError::Internal(err)
            })?;

        self.payment_record_repo
            .mark_refunded(record.id)
            .await
            .map_err(|err| {
                // The gateway refund went through; re-running this operation
                // repairs the ledger without refunding twice.
                error!(
                    receipt_number,
                    payment_id = %record.id,
                    refund_id = %refund.id,
                    db_error = ?err,
                    "refunds: failed to mark record refunded after gateway refund"
                );
                RefundError::Internal(err)
            })?;

        info!(
            receipt_number,
            payment_id = %record.id,
            refund_id = %refund.id,
            amount_minor = refund.amount,
            "refunds: payment refunded"
        );

        Ok(ReceiptRefundDto {
            receipt_number: record.receipt_number,
            refund_id: Some(refund.id),
            amount_minor: refund.amount,
            already_refunded: false,
        })
    }

    /// Refunds every recorded payment of a booking. The gateway calls run
    /// concurrently and the operation is all-or-nothing from the caller's
    /// perspective: one failed refund fails the whole call and no record is
    /// marked refunded.
    pub async fn refund_booking(&self, booking_id: Uuid) -> RefundResult<BookingRefundOutcome> {
        let records = self
            .payment_record_repo
            .find_by_booking_id(booking_id)
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "refunds: failed to load booking payments");
                RefundError::Internal(err)
            })?;

        let refundable: Vec<PaymentRecordEntity> = records
            .into_iter()
            .filter(|record| {
                PaymentRecordStatus::from_str(&record.status) == PaymentRecordStatus::Active
                    && !record.payment_intent_id.is_empty()
            })
            .collect();

        if refundable.is_empty() {
            info!(%booking_id, "refunds: no refundable payments for booking");
            return Ok(BookingRefundOutcome::NoPaymentFound);
        }

        info!(
            %booking_id,
            payment_count = refundable.len(),
            "refunds: refunding all booking payments"
        );

        let gateway_calls = refundable.iter().map(|record| {
            let stripe_client = Arc::clone(&self.stripe_client);
            async move {
                stripe_client
                    .refund_payment_intent(&record.payment_intent_id)
                    .await
            }
        });

        let refunds = try_join_all(gateway_calls).await.map_err(|err| {
            error!(
                %booking_id,
                error = ?err,
                "refunds: at least one gateway refund failed, aborting booking refund"
            );
            RefundError::Internal(err)
        })?;

        let mut results = Vec::with_capacity(refundable.len());
        let mut total_refunded_minor = 0i64;

        for (record, refund) in refundable.iter().zip(refunds) {
            self.payment_record_repo
                .mark_refunded(record.id)
                .await
                .map_err(|err| {
                    error!(
                        %booking_id,
                        payment_id = %record.id,
                        refund_id = %refund.id,
                        db_error = ?err,
                        "refunds: failed to mark record refunded"
                    );
                    RefundError::Internal(err)
                })?;

            total_refunded_minor += refund.amount;
            results.push(RefundDto {
                receipt_number: record.receipt_number.clone(),
                refund_id: Some(refund.id),
                amount_minor: refund.amount,
            });
        }

        info!(
            %booking_id,
            total_refunded_minor,
            refund_count = results.len(),
            "refunds: booking fully refunded"
        );

        Ok(BookingRefundOutcome::Refunded {
            refunds: results,
            total_refunded_minor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            entities::payment_records::PaymentRecordEntity,
            repositories::payment_records::MockPaymentRecordRepository,
            value_objects::enums::payment_types::PaymentType,
        },
        payments::stripe_client::StripeRefund,
        usecases::gateway::MockStripeGateway,
    };
    use chrono::Utc;
    use mockall::predicate::eq;

    fn record(
        booking_id: Uuid,
        payment_intent_id: &str,
        receipt_number: &str,
        amount_minor: i64,
        status: PaymentRecordStatus,
    ) -> PaymentRecordEntity {
        PaymentRecordEntity {
            id: Uuid::new_v4(),
            booking_id,
            amount_minor,
            payment_date: Utc::now(),
            payment_type: PaymentType::Installment.to_string(),
            payment_intent_id: payment_intent_id.to_string(),
            receipt_number: receipt_number.to_string(),
            status: status.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn booking_without_payments_reports_no_payment_found() {
        let booking_id = Uuid::new_v4();

        let mut payment_record_repo = MockPaymentRecordRepository::new();
        let mut stripe = MockStripeGateway::new();

        payment_record_repo
            .expect_find_by_booking_id()
            .with(eq(booking_id))
            .returning(|_| Box::pin(async { Ok(Vec::new()) }));
        stripe.expect_refund_payment_intent().times(0);

        let usecase = RefundUseCase::new(Arc::new(payment_record_repo), Arc::new(stripe));

        let outcome = usecase.refund_booking(booking_id).await.unwrap();
        assert!(matches!(outcome, BookingRefundOutcome::NoPaymentFound));
    }

    #[tokio::test]
    async fn one_failing_refund_fails_the_whole_booking_and_marks_nothing() {
        let booking_id = Uuid::new_v4();
        let records = vec![
            record(booking_id, "pi_1", "REC-1700000000000-0001", 10000, PaymentRecordStatus::Active),
            record(booking_id, "pi_2", "REC-1700000000000-0002", 10000, PaymentRecordStatus::Active),
            record(booking_id, "pi_3", "REC-1700000000000-0003", 10000, PaymentRecordStatus::Active),
        ];

        let mut payment_record_repo = MockPaymentRecordRepository::new();
        let mut stripe = MockStripeGateway::new();

        payment_record_repo
            .expect_find_by_booking_id()
            .returning(move |_| {
                let records = records.clone();
                Box::pin(async move { Ok(records) })
            });
        payment_record_repo.expect_mark_refunded().times(0);

        stripe
            .expect_refund_payment_intent()
            .returning(|payment_intent_id| {
                let fail = payment_intent_id == "pi_2";
                Box::pin(async move {
                    if fail {
                        anyhow::bail!("card issuer rejected the refund");
                    }
                    Ok(StripeRefund {
                        id: "re_ok".to_string(),
                        amount: 10000,
                    })
                })
            });

        let usecase = RefundUseCase::new(Arc::new(payment_record_repo), Arc::new(stripe));

        let err = usecase.refund_booking(booking_id).await.unwrap_err();
        assert!(matches!(err, RefundError::Internal(_)));
    }

    #[tokio::test]
    async fn successful_booking_refund_marks_every_record_and_sums_minor_units() {
        let booking_id = Uuid::new_v4();
        let records = vec![
            record(booking_id, "pi_1", "REC-1700000000000-0001", 10000, PaymentRecordStatus::Active),
            record(booking_id, "pi_2", "REC-1700000000000-0002", 5000, PaymentRecordStatus::Active),
        ];

        let mut payment_record_repo = MockPaymentRecordRepository::new();
        let mut stripe = MockStripeGateway::new();

        payment_record_repo
            .expect_find_by_booking_id()
            .returning(move |_| {
                let records = records.clone();
                Box::pin(async move { Ok(records) })
            });
        payment_record_repo
            .expect_mark_refunded()
            .times(2)
            .returning(|_| Box::pin(async { Ok(()) }));

        stripe
            .expect_refund_payment_intent()
            .returning(|payment_intent_id| {
                let amount = if payment_intent_id == "pi_1" { 10000 } else { 5000 };
                Box::pin(async move {
                    Ok(StripeRefund {
                        id: format!("re_{amount}"),
                        amount,
                    })
                })
            });

        let usecase = RefundUseCase::new(Arc::new(payment_record_repo), Arc::new(stripe));

        let outcome = usecase.refund_booking(booking_id).await.unwrap();
        match outcome {
            BookingRefundOutcome::Refunded {
                refunds,
                total_refunded_minor,
            } => {
                assert_eq!(refunds.len(), 2);
                assert_eq!(total_refunded_minor, 15000);
                // Clients see the total in major units.
                assert_eq!(
                    crate::domain::value_objects::money::to_major_units(total_refunded_minor),
                    150.0
                );
            }
            BookingRefundOutcome::NoPaymentFound => panic!("expected refunds"),
        }
    }

    #[tokio::test]
    async fn already_refunded_records_are_skipped_by_booking_refunds() {
        let booking_id = Uuid::new_v4();
        let records = vec![record(
            booking_id,
            "pi_done",
            "REC-1700000000000-0009",
            10000,
            PaymentRecordStatus::Refunded,
        )];

        let mut payment_record_repo = MockPaymentRecordRepository::new();
        let mut stripe = MockStripeGateway::new();

        payment_record_repo
            .expect_find_by_booking_id()
            .returning(move |_| {
                let records = records.clone();
                Box::pin(async move { Ok(records) })
            });
        stripe.expect_refund_payment_intent().times(0);

        let usecase = RefundUseCase::new(Arc::new(payment_record_repo), Arc::new(stripe));

        let outcome = usecase.refund_booking(booking_id).await.unwrap();
        assert!(matches!(outcome, BookingRefundOutcome::NoPaymentFound));
    }

    #[tokio::test]
    async fn refunding_an_unknown_receipt_is_not_found() {
        let mut payment_record_repo = MockPaymentRecordRepository::new();
        let stripe = MockStripeGateway::new();

        payment_record_repo
            .expect_find_by_receipt_number()
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = RefundUseCase::new(Arc::new(payment_record_repo), Arc::new(stripe));

        let err = usecase
            .refund_payment("REC-1700000000000-9999")
            .await
            .unwrap_err();
        assert!(matches!(err, RefundError::RecordNotFound));
    }

    #[tokio::test]
    async fn refunding_an_already_refunded_receipt_skips_the_gateway() {
        let booking_id = Uuid::new_v4();
        let refunded = record(
            booking_id,
            "pi_done",
            "REC-1700000000000-0042",
            15000,
            PaymentRecordStatus::Refunded,
        );

        let mut payment_record_repo = MockPaymentRecordRepository::new();
        let mut stripe = MockStripeGateway::new();

        payment_record_repo
            .expect_find_by_receipt_number()
            .returning(move |_| {
                let refunded = refunded.clone();
                Box::pin(async move { Ok(Some(refunded)) })
            });
        payment_record_repo.expect_mark_refunded().times(0);
        stripe.expect_refund_payment_intent().times(0);

        let usecase = RefundUseCase::new(Arc::new(payment_record_repo), Arc::new(stripe));

        let refund = usecase
            .refund_payment("REC-1700000000000-0042")
            .await
            .unwrap();
        assert!(refund.already_refunded);
        assert_eq!(refund.amount_minor, 15000);
    }

    #[tokio::test]
    async fn refunding_an_active_receipt_marks_it_refunded() {
        let booking_id = Uuid::new_v4();
        let active = record(
            booking_id,
            "pi_active",
            "REC-1700000000000-0007",
            15000,
            PaymentRecordStatus::Active,
        );
        let record_id = active.id;

        let mut payment_record_repo = MockPaymentRecordRepository::new();
        let mut stripe = MockStripeGateway::new();

        payment_record_repo
            .expect_find_by_receipt_number()
            .returning(move |_| {
                let active = active.clone();
                Box::pin(async move { Ok(Some(active)) })
            });
        payment_record_repo
            .expect_mark_refunded()
            .with(eq(record_id))
            .times(1)
            .returning(|_| Box::pin(async { Ok(()) }));
        stripe
            .expect_refund_payment_intent()
            .with(eq("pi_active"))
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    Ok(StripeRefund {
                        id: "re_1".to_string(),
                        amount: 15000,
                    })
                })
            });

        let usecase = RefundUseCase::new(Arc::new(payment_record_repo), Arc::new(stripe));

        let refund = usecase
            .refund_payment("REC-1700000000000-0007")
            .await
            .unwrap();
        assert_eq!(refund.refund_id.as_deref(), Some("re_1"));
        assert!(!refund.already_refunded);
    }
}
