use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::config_model::DotEnvyConfig,
    domain::{
        repositories::{
            customers::CustomerRepository, payment_sessions::PaymentSessionRepository,
        },
        value_objects::plans::PlanCatalog,
    },
    infrastructure::{
        axum_http::error_responses,
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{customers::CustomerPostgres, payment_sessions::PaymentSessionPostgres},
        },
    },
    payments::stripe_client::StripeClient,
    usecases::{gateway::StripeGateway, subscriptions::SubscriptionUseCase},
};

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let customer_repository = Arc::new(CustomerPostgres::new(Arc::clone(&db_pool)));
    let session_repository = Arc::new(PaymentSessionPostgres::new(Arc::clone(&db_pool)));
    let stripe_client = Arc::new(StripeClient::new(config.stripe.secret_key.clone()));
    let plan_catalog = PlanCatalog::new(
        config.plans.golden_monthly_price.clone(),
        config.plans.golden_yearly_price.clone(),
    );

    let subscriptions_usecase = Arc::new(SubscriptionUseCase::new(
        customer_repository,
        session_repository,
        stripe_client,
        plan_catalog,
    ));

    Router::new()
        .route("/create", post(create_subscription))
        .route("/confirm", post(confirm_subscription))
        .route("/cancel", post(cancel_subscription))
        .route("/get", post(get_subscription))
        .route("/metadata", post(update_subscription_metadata))
        .with_state(subscriptions_usecase)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    pub plan_id: String,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionResponse {
    pub subscription_id: String,
    pub session_id: Uuid,
    pub client_secret: String,
}

pub async fn create_subscription<Cust, Sess, Stripe>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<Cust, Sess, Stripe>>>,
    Json(payload): Json<CreateSubscriptionRequest>,
) -> Response
where
    Cust: CustomerRepository + Send + Sync + 'static,
    Sess: PaymentSessionRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    match subscriptions_usecase
        .create_subscription(&payload.plan_id, &payload.user_id)
        .await
    {
        Ok(created) => (
            StatusCode::OK,
            Json(CreateSubscriptionResponse {
                subscription_id: created.subscription_id,
                session_id: created.session_id,
                client_secret: created.client_secret,
            }),
        )
            .into_response(),
        Err(err) => error_responses::render_error(err.status_code(), &err),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmSubscriptionRequest {
    pub session_id: Uuid,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse {
    pub success: bool,
}

pub async fn confirm_subscription<Cust, Sess, Stripe>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<Cust, Sess, Stripe>>>,
    Json(payload): Json<ConfirmSubscriptionRequest>,
) -> Response
where
    Cust: CustomerRepository + Send + Sync + 'static,
    Sess: PaymentSessionRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    match subscriptions_usecase
        .confirm_subscription(payload.session_id, &payload.user_id)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(SuccessResponse { success: true })).into_response(),
        Err(err) => error_responses::render_error(err.status_code(), &err),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSubscriptionRequest {
    pub subscription_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSubscriptionResponse {
    pub message: String,
    pub subscription_id: String,
}

pub async fn cancel_subscription<Cust, Sess, Stripe>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<Cust, Sess, Stripe>>>,
    Json(payload): Json<CancelSubscriptionRequest>,
) -> Response
where
    Cust: CustomerRepository + Send + Sync + 'static,
    Sess: PaymentSessionRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    match subscriptions_usecase
        .cancel_subscription(&payload.subscription_id)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(CancelSubscriptionResponse {
                message: "subscription canceled".to_string(),
                subscription_id: payload.subscription_id,
            }),
        )
            .into_response(),
        Err(err) => error_responses::render_error(err.status_code(), &err),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSubscriptionRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSubscriptionResponse {
    pub subscription_id: String,
}

pub async fn get_subscription<Cust, Sess, Stripe>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<Cust, Sess, Stripe>>>,
    Json(payload): Json<GetSubscriptionRequest>,
) -> Response
where
    Cust: CustomerRepository + Send + Sync + 'static,
    Sess: PaymentSessionRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    match subscriptions_usecase.get_subscription(&payload.user_id).await {
        Ok(subscription_id) => (
            StatusCode::OK,
            Json(GetSubscriptionResponse { subscription_id }),
        )
            .into_response(),
        Err(err) => error_responses::render_error(err.status_code(), &err),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriptionMetadataRequest {
    pub subscription_id: String,
    pub user_id: String,
    pub plan_id: String,
}

pub async fn update_subscription_metadata<Cust, Sess, Stripe>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<Cust, Sess, Stripe>>>,
    Json(payload): Json<UpdateSubscriptionMetadataRequest>,
) -> Response
where
    Cust: CustomerRepository + Send + Sync + 'static,
    Sess: PaymentSessionRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    match subscriptions_usecase
        .update_subscription_metadata(
            &payload.subscription_id,
            &payload.user_id,
            &payload.plan_id,
        )
        .await
    {
        Ok(()) => (StatusCode::OK, Json(SuccessResponse { success: true })).into_response(),
        Err(err) => error_responses::render_error(err.status_code(), &err),
    }
}
