use std::collections::HashMap;

use anyhow::Result as AnyResult;
use async_trait::async_trait;

use crate::payments::stripe_client::{
    StripeClient, StripePaymentIntent, StripePaymentMethod, StripeRefund, StripeSubscription,
};

/// Gateway seam consumed by the orchestrator. Every call is a fallible
/// network operation; failures propagate as typed errors at the use-case
/// boundary.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait StripeGateway: Send + Sync {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: HashMap<String, String>,
    ) -> AnyResult<StripePaymentIntent>;

    async fn create_setup_intent(&self, customer_id: &str) -> AnyResult<String>;

    async fn create_customer(&self, email: &str, user_id: &str) -> AnyResult<String>;

    async fn find_customer_by_user_id(&self, user_id: &str) -> AnyResult<Option<String>>;

    async fn create_incomplete_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
        metadata: HashMap<String, String>,
    ) -> AnyResult<StripeSubscription>;

    async fn retrieve_subscription(&self, subscription_id: &str) -> AnyResult<StripeSubscription>;

    async fn cancel_subscription_now(&self, subscription_id: &str) -> AnyResult<String>;

    async fn update_subscription_metadata(
        &self,
        subscription_id: &str,
        metadata: HashMap<String, String>,
    ) -> AnyResult<()>;

    async fn list_active_subscriptions(
        &self,
        customer_id: &str,
    ) -> AnyResult<Vec<StripeSubscription>>;

    async fn refund_payment_intent(&self, payment_intent_id: &str) -> AnyResult<StripeRefund>;

    async fn list_payment_methods(&self, customer_id: &str)
        -> AnyResult<Vec<StripePaymentMethod>>;

    async fn default_payment_method(&self, customer_id: &str) -> AnyResult<Option<String>>;

    async fn detach_payment_method(&self, payment_method_id: &str) -> AnyResult<()>;
}

#[async_trait]
impl StripeGateway for StripeClient {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: HashMap<String, String>,
    ) -> AnyResult<StripePaymentIntent> {
        self.create_payment_intent(amount_minor, currency, metadata)
            .await
    }

    async fn create_setup_intent(&self, customer_id: &str) -> AnyResult<String> {
        self.create_setup_intent(customer_id).await
    }

    async fn create_customer(&self, email: &str, user_id: &str) -> AnyResult<String> {
        self.create_customer(email, user_id).await
    }

    async fn find_customer_by_user_id(&self, user_id: &str) -> AnyResult<Option<String>> {
        self.find_customer_by_user_id(user_id).await
    }

    async fn create_incomplete_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
        metadata: HashMap<String, String>,
    ) -> AnyResult<StripeSubscription> {
        self.create_incomplete_subscription(customer_id, price_id, metadata)
            .await
    }

    async fn retrieve_subscription(&self, subscription_id: &str) -> AnyResult<StripeSubscription> {
        self.retrieve_subscription(subscription_id).await
    }

    async fn cancel_subscription_now(&self, subscription_id: &str) -> AnyResult<String> {
        self.cancel_subscription_now(subscription_id).await
    }

    async fn update_subscription_metadata(
        &self,
        subscription_id: &str,
        metadata: HashMap<String, String>,
    ) -> AnyResult<()> {
        self.update_subscription_metadata(subscription_id, metadata)
            .await
    }

    async fn list_active_subscriptions(
        &self,
        customer_id: &str,
    ) -> AnyResult<Vec<StripeSubscription>> {
        self.list_active_subscriptions(customer_id).await
    }

    async fn refund_payment_intent(&self, payment_intent_id: &str) -> AnyResult<StripeRefund> {
        self.refund_payment_intent(payment_intent_id).await
    }

    async fn list_payment_methods(
        &self,
        customer_id: &str,
    ) -> AnyResult<Vec<StripePaymentMethod>> {
        self.list_payment_methods(customer_id).await
    }

    async fn default_payment_method(&self, customer_id: &str) -> AnyResult<Option<String>> {
        self.default_payment_method(customer_id).await
    }

    async fn detach_payment_method(&self, payment_method_id: &str) -> AnyResult<()> {
        self.detach_payment_method(payment_method_id).await
    }
}
