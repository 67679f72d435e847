use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    domain::repositories::customers::CustomerRepository,
    payments::stripe_client::StripePaymentMethod, usecases::gateway::StripeGateway,
};

#[derive(Debug, Error)]
pub enum PaymentMethodError {
    #[error("no gateway customer for user")]
    CustomerNotFound,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PaymentMethodError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PaymentMethodError::CustomerNotFound => StatusCode::BAD_REQUEST,
            PaymentMethodError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type PaymentMethodResult<T> = std::result::Result<T, PaymentMethodError>;

#[derive(Debug, Clone)]
pub struct PaymentMethodsDto {
    pub payment_methods: Vec<StripePaymentMethod>,
    pub default_payment_method: Option<String>,
}

pub struct PaymentMethodUseCase<Cust, Stripe>
where
    Cust: CustomerRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    customer_repo: Arc<Cust>,
    stripe_client: Arc<Stripe>,
}

impl<Cust, Stripe> PaymentMethodUseCase<Cust, Stripe>
where
    Cust: CustomerRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    pub fn new(customer_repo: Arc<Cust>, stripe_client: Arc<Stripe>) -> Self {
        Self {
            customer_repo,
            stripe_client,
        }
    }

    pub async fn create_setup_intent(&self, user_id: &str) -> PaymentMethodResult<String> {
        let customer_id = self.require_stripe_customer(user_id).await?;

        let client_secret = self
            .stripe_client
            .create_setup_intent(&customer_id)
            .await
            .map_err(|err| {
                error!(
                    user_id,
                    customer_id = %customer_id,
                    error = ?err,
                    "payment_methods: setup intent creation failed"
                );
                PaymentMethodError::Internal(err)
            })?;

        info!(user_id, "payment_methods: setup intent created");
        Ok(client_secret)
    }

    pub async fn list_payment_methods(
        &self,
        user_id: &str,
    ) -> PaymentMethodResult<PaymentMethodsDto> {
        let customer_id = self.require_stripe_customer(user_id).await?;

        let payment_methods = self
            .stripe_client
            .list_payment_methods(&customer_id)
            .await
            .map_err(|err| {
                error!(user_id, error = ?err, "payment_methods: listing failed");
                PaymentMethodError::Internal(err)
            })?;

        let default_payment_method = self
            .stripe_client
            .default_payment_method(&customer_id)
            .await
            .map_err(|err| {
                error!(user_id, error = ?err, "payment_methods: default lookup failed");
                PaymentMethodError::Internal(err)
            })?;

        Ok(PaymentMethodsDto {
            payment_methods,
            default_payment_method,
        })
    }

    pub async fn detach_payment_method(&self, payment_method_id: &str) -> PaymentMethodResult<()> {
        self.stripe_client
            .detach_payment_method(payment_method_id)
            .await
            .map_err(|err| {
                error!(
                    payment_method_id,
                    error = ?err,
                    "payment_methods: detach failed"
                );
                PaymentMethodError::Internal(err)
            })?;

        info!(payment_method_id, "payment_methods: payment method detached");
        Ok(())
    }

    async fn require_stripe_customer(&self, user_id: &str) -> PaymentMethodResult<String> {
        let cached = self
            .customer_repo
            .find_by_user_id(user_id)
            .await
            .map_err(|err| {
                error!(user_id, db_error = ?err, "payment_methods: customer record lookup failed");
                PaymentMethodError::Internal(err)
            })?
            .and_then(|customer| customer.stripe_customer_id);

        if let Some(customer_id) = cached {
            return Ok(customer_id);
        }

        self.stripe_client
            .find_customer_by_user_id(user_id)
            .await
            .map_err(|err| {
                error!(user_id, error = ?err, "payment_methods: customer search failed");
                PaymentMethodError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(user_id, "payment_methods: user has no gateway customer");
                PaymentMethodError::CustomerNotFound
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            entities::customers::CustomerEntity,
            repositories::customers::MockCustomerRepository,
            value_objects::enums::customer_plans::CustomerPlan,
        },
        usecases::gateway::MockStripeGateway,
    };
    use chrono::Utc;
    use mockall::predicate::eq;
    use uuid::Uuid;

    fn customer_with_stripe_id(user_id: &str) -> CustomerEntity {
        CustomerEntity {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            email: "driver@example.com".to_string(),
            stripe_customer_id: Some("cus_1".to_string()),
            plan: CustomerPlan::Standard.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn setup_intent_uses_the_cached_stripe_customer() {
        let mut customer_repo = MockCustomerRepository::new();
        let mut stripe = MockStripeGateway::new();

        customer_repo
            .expect_find_by_user_id()
            .with(eq("user_1"))
            .returning(|user_id| {
                let customer = customer_with_stripe_id(user_id);
                Box::pin(async move { Ok(Some(customer)) })
            });
        stripe
            .expect_create_setup_intent()
            .with(eq("cus_1"))
            .times(1)
            .returning(|_| Box::pin(async { Ok("seti_secret".to_string()) }));
        stripe.expect_find_customer_by_user_id().times(0);

        let usecase = PaymentMethodUseCase::new(Arc::new(customer_repo), Arc::new(stripe));

        let secret = usecase.create_setup_intent("user_1").await.unwrap();
        assert_eq!(secret, "seti_secret");
    }

    #[tokio::test]
    async fn users_without_a_gateway_customer_are_rejected() {
        let mut customer_repo = MockCustomerRepository::new();
        let mut stripe = MockStripeGateway::new();

        customer_repo
            .expect_find_by_user_id()
            .returning(|_| Box::pin(async { Ok(None) }));
        stripe
            .expect_find_customer_by_user_id()
            .returning(|_| Box::pin(async { Ok(None) }));
        stripe.expect_create_setup_intent().times(0);

        let usecase = PaymentMethodUseCase::new(Arc::new(customer_repo), Arc::new(stripe));

        let err = usecase.create_setup_intent("ghost").await.unwrap_err();
        assert!(matches!(err, PaymentMethodError::CustomerNotFound));
    }
}
