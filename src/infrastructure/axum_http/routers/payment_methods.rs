use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{
    config::config_model::DotEnvyConfig,
    domain::repositories::customers::CustomerRepository,
    infrastructure::{
        axum_http::error_responses,
        postgres::{
            postgres_connection::PgPoolSquad, repositories::customers::CustomerPostgres,
        },
    },
    payments::stripe_client::{StripeClient, StripePaymentMethod},
    usecases::{gateway::StripeGateway, payment_methods::PaymentMethodUseCase},
};

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let customer_repository = Arc::new(CustomerPostgres::new(Arc::clone(&db_pool)));
    let stripe_client = Arc::new(StripeClient::new(config.stripe.secret_key.clone()));

    let payment_methods_usecase = Arc::new(PaymentMethodUseCase::new(
        customer_repository,
        stripe_client,
    ));

    Router::new()
        .route("/setup-intent", post(create_setup_intent))
        .route(
            "/",
            get(list_payment_methods).delete(detach_payment_method),
        )
        .with_state(payment_methods_usecase)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSetupIntentRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSetupIntentResponse {
    pub client_secret: String,
}

pub async fn create_setup_intent<Cust, Stripe>(
    State(payment_methods_usecase): State<Arc<PaymentMethodUseCase<Cust, Stripe>>>,
    Json(payload): Json<CreateSetupIntentRequest>,
) -> Response
where
    Cust: CustomerRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    match payment_methods_usecase
        .create_setup_intent(&payload.user_id)
        .await
    {
        Ok(client_secret) => (
            StatusCode::OK,
            Json(CreateSetupIntentResponse { client_secret }),
        )
            .into_response(),
        Err(err) => error_responses::render_error(err.status_code(), &err),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPaymentMethodsQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPaymentMethodsResponse {
    pub payment_methods: Vec<StripePaymentMethod>,
    pub default_payment_method: Option<String>,
}

pub async fn list_payment_methods<Cust, Stripe>(
    State(payment_methods_usecase): State<Arc<PaymentMethodUseCase<Cust, Stripe>>>,
    Query(query): Query<ListPaymentMethodsQuery>,
) -> Response
where
    Cust: CustomerRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    match payment_methods_usecase
        .list_payment_methods(&query.user_id)
        .await
    {
        Ok(methods) => (
            StatusCode::OK,
            Json(ListPaymentMethodsResponse {
                payment_methods: methods.payment_methods,
                default_payment_method: methods.default_payment_method,
            }),
        )
            .into_response(),
        Err(err) => error_responses::render_error(err.status_code(), &err),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetachPaymentMethodRequest {
    pub payment_method_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse {
    pub success: bool,
}

pub async fn detach_payment_method<Cust, Stripe>(
    State(payment_methods_usecase): State<Arc<PaymentMethodUseCase<Cust, Stripe>>>,
    Json(payload): Json<DetachPaymentMethodRequest>,
) -> Response
where
    Cust: CustomerRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    match payment_methods_usecase
        .detach_payment_method(&payload.payment_method_id)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(SuccessResponse { success: true })).into_response(),
        Err(err) => error_responses::render_error(err.status_code(), &err),
    }
}
