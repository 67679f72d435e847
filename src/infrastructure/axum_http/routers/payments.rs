use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::config_model::DotEnvyConfig,
    domain::{
        repositories::{bookings::BookingRepository, payment_records::PaymentRecordRepository},
        value_objects::{enums::payment_types::PaymentType, money},
    },
    infrastructure::{
        axum_http::error_responses,
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{bookings::BookingPostgres, payment_records::PaymentRecordPostgres},
        },
    },
    payments::stripe_client::StripeClient,
    usecases::{
        gateway::StripeGateway,
        payments::{PaymentChoice, PaymentUseCase, RecordPaymentModel},
        refunds::{BookingRefundOutcome, RefundUseCase},
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let booking_repository = Arc::new(BookingPostgres::new(Arc::clone(&db_pool)));
    let payment_record_repository = Arc::new(PaymentRecordPostgres::new(Arc::clone(&db_pool)));
    let stripe_client = Arc::new(StripeClient::new(config.stripe.secret_key.clone()));

    let payments_usecase = Arc::new(PaymentUseCase::new(
        Arc::clone(&booking_repository),
        Arc::clone(&payment_record_repository),
        Arc::clone(&stripe_client),
        config.stripe.currency.clone(),
    ));
    let refunds_usecase = Arc::new(RefundUseCase::new(
        Arc::clone(&payment_record_repository),
        Arc::clone(&stripe_client),
    ));

    Router::new()
        .route(
            "/create-payment-intent",
            post(create_payment_intent).with_state(Arc::clone(&payments_usecase)),
        )
        .route(
            "/booking-intent",
            post(create_booking_intent).with_state(Arc::clone(&payments_usecase)),
        )
        .route("/record", post(record_payment).with_state(payments_usecase))
        .route(
            "/refund",
            post(refund_booking).with_state(Arc::clone(&refunds_usecase)),
        )
        .route(
            "/refund-receipt",
            post(refund_receipt).with_state(refunds_usecase),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentRequest {
    pub amount: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentResponse {
    pub client_secret: String,
}

pub async fn create_payment_intent<B, P, Stripe>(
    State(payments_usecase): State<Arc<PaymentUseCase<B, P, Stripe>>>,
    Json(payload): Json<CreatePaymentIntentRequest>,
) -> Response
where
    B: BookingRepository + Send + Sync + 'static,
    P: PaymentRecordRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    match payments_usecase.create_payment_intent(payload.amount).await {
        Ok(client_secret) => (
            StatusCode::OK,
            Json(CreatePaymentIntentResponse { client_secret }),
        )
            .into_response(),
        Err(err) => error_responses::render_error(err.status_code(), &err),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingIntentRequest {
    pub booking_id: Uuid,
    pub choice: PaymentChoice,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingIntentResponse {
    pub payment_intent_id: String,
    pub client_secret: String,
    pub amount: i64,
    pub payment_type: PaymentType,
}

pub async fn create_booking_intent<B, P, Stripe>(
    State(payments_usecase): State<Arc<PaymentUseCase<B, P, Stripe>>>,
    Json(payload): Json<BookingIntentRequest>,
) -> Response
where
    B: BookingRepository + Send + Sync + 'static,
    P: PaymentRecordRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    match payments_usecase
        .create_installment_or_full_payment(payload.booking_id, payload.choice)
        .await
    {
        Ok(intent) => (
            StatusCode::OK,
            Json(BookingIntentResponse {
                payment_intent_id: intent.payment_intent_id,
                client_secret: intent.client_secret,
                amount: intent.amount_minor,
                payment_type: intent.payment_type,
            }),
        )
            .into_response(),
        Err(err) => error_responses::render_error(err.status_code(), &err),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    pub booking_id: Uuid,
    pub amount: i64,
    pub payment_date: DateTime<Utc>,
    pub payment_type: PaymentType,
    pub payment_intent_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentResponse {
    pub payment_id: Uuid,
    pub receipt_number: String,
}

pub async fn record_payment<B, P, Stripe>(
    State(payments_usecase): State<Arc<PaymentUseCase<B, P, Stripe>>>,
    Json(payload): Json<RecordPaymentRequest>,
) -> Response
where
    B: BookingRepository + Send + Sync + 'static,
    P: PaymentRecordRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    let model = RecordPaymentModel {
        booking_id: payload.booking_id,
        amount_minor: payload.amount,
        payment_date: payload.payment_date,
        payment_type: payload.payment_type,
        payment_intent_id: payload.payment_intent_id,
    };

    match payments_usecase.record_payment(model).await {
        Ok(recorded) => (
            StatusCode::OK,
            Json(RecordPaymentResponse {
                payment_id: recorded.payment_id,
                receipt_number: recorded.receipt_number,
            }),
        )
            .into_response(),
        Err(err) => error_responses::render_error(err.status_code(), &err),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundBookingRequest {
    pub booking_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundEntry {
    pub receipt_number: String,
    pub refund_id: Option<String>,
    pub amount_minor: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundBookingResponse {
    pub success: bool,
    pub refunds: Vec<RefundEntry>,
    pub total_refunded: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoPaymentFoundResponse {
    pub success: bool,
    pub message: String,
}

pub async fn refund_booking<P, Stripe>(
    State(refunds_usecase): State<Arc<RefundUseCase<P, Stripe>>>,
    Json(payload): Json<RefundBookingRequest>,
) -> Response
where
    P: PaymentRecordRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    match refunds_usecase.refund_booking(payload.booking_id).await {
        Ok(BookingRefundOutcome::NoPaymentFound) => (
            StatusCode::ACCEPTED,
            Json(NoPaymentFoundResponse {
                success: true,
                message: "no_payment_found".to_string(),
            }),
        )
            .into_response(),
        Ok(BookingRefundOutcome::Refunded {
            refunds,
            total_refunded_minor,
        }) => {
            let refunds = refunds
                .into_iter()
                .map(|refund| RefundEntry {
                    receipt_number: refund.receipt_number,
                    refund_id: refund.refund_id,
                    amount_minor: refund.amount_minor,
                })
                .collect();

            (
                StatusCode::OK,
                Json(RefundBookingResponse {
                    success: true,
                    refunds,
                    total_refunded: money::to_major_units(total_refunded_minor),
                }),
            )
                .into_response()
        }
        Err(err) => error_responses::render_error(err.status_code(), &err),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundReceiptRequest {
    pub receipt_number: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundReceiptResponse {
    pub success: bool,
    pub receipt_number: String,
    pub refund_id: Option<String>,
    pub amount_minor: i64,
    pub already_refunded: bool,
}

pub async fn refund_receipt<P, Stripe>(
    State(refunds_usecase): State<Arc<RefundUseCase<P, Stripe>>>,
    Json(payload): Json<RefundReceiptRequest>,
) -> Response
where
    P: PaymentRecordRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    match refunds_usecase.refund_payment(&payload.receipt_number).await {
        Ok(refund) => (
            StatusCode::OK,
            Json(RefundReceiptResponse {
                success: true,
                receipt_number: refund.receipt_number,
                refund_id: refund.refund_id,
                amount_minor: refund.amount_minor,
                already_refunded: refund.already_refunded,
            }),
        )
            .into_response(),
        Err(err) => error_responses::render_error(err.status_code(), &err),
    }
}
