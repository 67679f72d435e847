use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    domain::{
        entities::payment_records::NewPaymentRecordEntity,
        repositories::{
            bookings::BookingRepository,
            payment_records::{PaymentRecordInsert, PaymentRecordRepository},
        },
        value_objects::{
            enums::{payment_record_statuses::PaymentRecordStatus, payment_types::PaymentType},
            receipts,
        },
    },
    usecases::gateway::StripeGateway,
};

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("booking not found")]
    BookingNotFound,

    #[error("booking has no outstanding balance")]
    NothingOwed,

    #[error("receipt number space exhausted")]
    ExhaustedRetries,

    #[error("invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PaymentError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PaymentError::BookingNotFound => StatusCode::NOT_FOUND,
            PaymentError::NothingOwed | PaymentError::Validation(_) => StatusCode::BAD_REQUEST,
            PaymentError::ExhaustedRetries => StatusCode::SERVICE_UNAVAILABLE,
            PaymentError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type PaymentResult<T> = std::result::Result<T, PaymentError>;

/// Which slice of the booking's balance the customer is paying.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentChoice {
    Next,
    Remaining,
}

#[derive(Debug, Clone)]
pub struct RecordPaymentModel {
    pub booking_id: Uuid,
    pub amount_minor: i64,
    pub payment_date: DateTime<Utc>,
    pub payment_type: PaymentType,
    pub payment_intent_id: String,
}

#[derive(Debug, Clone)]
pub struct RecordedPaymentDto {
    pub payment_id: Uuid,
    pub receipt_number: String,
}

#[derive(Debug, Clone)]
pub struct PaymentIntentDto {
    pub payment_intent_id: String,
    pub client_secret: String,
    pub amount_minor: i64,
    pub payment_type: PaymentType,
}

pub struct PaymentUseCase<B, P, Stripe>
where
    B: BookingRepository + Send + Sync + 'static,
    P: PaymentRecordRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    booking_repo: Arc<B>,
    payment_record_repo: Arc<P>,
    stripe_client: Arc<Stripe>,
    currency: String,
}

impl<B, P, Stripe> PaymentUseCase<B, P, Stripe>
where
    B: BookingRepository + Send + Sync + 'static,
    P: PaymentRecordRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    pub fn new(
        booking_repo: Arc<B>,
        payment_record_repo: Arc<P>,
        stripe_client: Arc<Stripe>,
        currency: String,
    ) -> Self {
        Self {
            booking_repo,
            payment_record_repo,
            stripe_client,
            currency,
        }
    }

    /// Records a captured payment in the ledger. At most one record exists
    /// per payment intent: duplicate client retries get the stored
    /// identifiers back instead of a second row.
    pub async fn record_payment(
        &self,
        model: RecordPaymentModel,
    ) -> PaymentResult<RecordedPaymentDto> {
        if model.payment_intent_id.trim().is_empty() {
            return Err(PaymentError::Validation(
                "paymentIntentId is required".to_string(),
            ));
        }
        if model.amount_minor <= 0 {
            return Err(PaymentError::Validation(
                "amount must be positive".to_string(),
            ));
        }

        info!(
            booking_id = %model.booking_id,
            payment_intent_id = %model.payment_intent_id,
            amount_minor = model.amount_minor,
            payment_type = %model.payment_type,
            "payments: recording payment"
        );

        if let Some(existing) = self
            .payment_record_repo
            .find_by_payment_intent_id(&model.payment_intent_id)
            .await
            .map_err(|err| {
                error!(
                    payment_intent_id = %model.payment_intent_id,
                    db_error = ?err,
                    "payments: failed to look up payment record by intent"
                );
                PaymentError::Internal(err)
            })?
        {
            info!(
                payment_id = %existing.id,
                receipt_number = %existing.receipt_number,
                "payments: payment intent already recorded, returning stored identifiers"
            );
            return Ok(RecordedPaymentDto {
                payment_id: existing.id,
                receipt_number: existing.receipt_number,
            });
        }

        for _ in 0..(receipts::NARROW_SUFFIX_ATTEMPTS + receipts::WIDE_SUFFIX_ATTEMPTS) {
            let receipt_number = self.generate_unique_receipt_number().await?;

            let insert = self
                .payment_record_repo
                .insert(NewPaymentRecordEntity {
                    booking_id: model.booking_id,
                    amount_minor: model.amount_minor,
                    payment_date: model.payment_date,
                    payment_type: model.payment_type.to_string(),
                    payment_intent_id: model.payment_intent_id.clone(),
                    receipt_number,
                    status: PaymentRecordStatus::Active.to_string(),
                })
                .await
                .map_err(|err| {
                    error!(
                        booking_id = %model.booking_id,
                        payment_intent_id = %model.payment_intent_id,
                        db_error = ?err,
                        "payments: failed to insert payment record"
                    );
                    PaymentError::Internal(err)
                })?;

            match insert {
                PaymentRecordInsert::Created(record) => {
                    self.booking_repo
                        .apply_payment(model.booking_id, model.amount_minor)
                        .await
                        .map_err(|err| {
                            error!(
                                booking_id = %model.booking_id,
                                payment_id = %record.id,
                                db_error = ?err,
                                "payments: failed to apply payment to booking"
                            );
                            PaymentError::Internal(err)
                        })?;

                    info!(
                        payment_id = %record.id,
                        receipt_number = %record.receipt_number,
                        "payments: payment recorded"
                    );
                    return Ok(RecordedPaymentDto {
                        payment_id: record.id,
                        receipt_number: record.receipt_number,
                    });
                }
                PaymentRecordInsert::Existing(record) => {
                    // A concurrent recording of the same intent won the insert.
                    info!(
                        payment_id = %record.id,
                        receipt_number = %record.receipt_number,
                        "payments: concurrent duplicate recording converged on existing record"
                    );
                    return Ok(RecordedPaymentDto {
                        payment_id: record.id,
                        receipt_number: record.receipt_number,
                    });
                }
                PaymentRecordInsert::ReceiptCollision => {
                    // A racing insert took the receipt between the uniqueness
                    // check and the write.
                    warn!(
                        booking_id = %model.booking_id,
                        payment_intent_id = %model.payment_intent_id,
                        "payments: receipt number collided at insert, regenerating"
                    );
                }
            }
        }

        error!(
            booking_id = %model.booking_id,
            payment_intent_id = %model.payment_intent_id,
            "payments: exhausted receipt number attempts at insert"
        );
        Err(PaymentError::ExhaustedRetries)
    }

    /// Prepares a gateway payment intent for the next installment or the full
    /// remaining balance. Nothing is written to the ledger here: recording
    /// happens only after the client confirms the capture.
    pub async fn create_installment_or_full_payment(
        &self,
        booking_id: Uuid,
        choice: PaymentChoice,
    ) -> PaymentResult<PaymentIntentDto> {
        let booking = self
            .booking_repo
            .find_by_id(booking_id)
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "payments: failed to load booking");
                PaymentError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%booking_id, "payments: booking not found for payment intent");
                PaymentError::BookingNotFound
            })?;

        if booking.remaining_amount_minor <= 0 {
            warn!(%booking_id, "payments: booking already fully paid");
            return Err(PaymentError::NothingOwed);
        }

        let (amount_minor, payment_type) = match choice {
            PaymentChoice::Next => (
                booking
                    .installment_amount_minor
                    .min(booking.remaining_amount_minor),
                PaymentType::Installment,
            ),
            PaymentChoice::Remaining => (booking.remaining_amount_minor, PaymentType::Full),
        };

        let metadata = HashMap::from([
            ("booking_id".to_string(), booking_id.to_string()),
            ("payment_type".to_string(), payment_type.to_string()),
        ]);

        info!(
            %booking_id,
            amount_minor,
            payment_type = %payment_type,
            "payments: creating payment intent for booking"
        );

        let intent = self
            .stripe_client
            .create_payment_intent(amount_minor, &self.currency, metadata)
            .await
            .map_err(|err| {
                error!(
                    %booking_id,
                    amount_minor,
                    error = ?err,
                    "payments: stripe payment intent creation failed"
                );
                PaymentError::Internal(err)
            })?;

        let client_secret = intent.client_secret.ok_or_else(|| {
            PaymentError::Internal(anyhow::anyhow!("payment intent client secret is missing"))
        })?;

        Ok(PaymentIntentDto {
            payment_intent_id: intent.id,
            client_secret,
            amount_minor,
            payment_type,
        })
    }

    /// Raw intent creation for callers that already know the amount.
    pub async fn create_payment_intent(&self, amount_minor: i64) -> PaymentResult<String> {
        if amount_minor <= 0 {
            return Err(PaymentError::Validation(
                "amount must be positive".to_string(),
            ));
        }

        let intent = self
            .stripe_client
            .create_payment_intent(amount_minor, &self.currency, HashMap::new())
            .await
            .map_err(|err| {
                error!(amount_minor, error = ?err, "payments: stripe payment intent creation failed");
                PaymentError::Internal(err)
            })?;

        intent.client_secret.ok_or_else(|| {
            PaymentError::Internal(anyhow::anyhow!("payment intent client secret is missing"))
        })
    }

    async fn generate_unique_receipt_number(&self) -> PaymentResult<String> {
        let total_attempts = receipts::NARROW_SUFFIX_ATTEMPTS + receipts::WIDE_SUFFIX_ATTEMPTS;

        for attempt in 0..total_attempts {
            let candidate = if attempt < receipts::NARROW_SUFFIX_ATTEMPTS {
                receipts::generate_receipt_number()
            } else {
                receipts::generate_wide_receipt_number()
            };

            let exists = self
                .payment_record_repo
                .receipt_number_exists(&candidate)
                .await
                .map_err(|err| {
                    error!(db_error = ?err, "payments: receipt uniqueness check failed");
                    PaymentError::Internal(err)
                })?;

            if !exists {
                return Ok(candidate);
            }

            warn!(attempt, "payments: receipt number collision, regenerating");
        }

        error!("payments: exhausted receipt number attempts");
        Err(PaymentError::ExhaustedRetries)
    }
}
