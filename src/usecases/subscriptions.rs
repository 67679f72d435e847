use std::{collections::HashMap, sync::Arc};

use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    domain::{
        entities::payment_sessions::NewPaymentSessionEntity,
        repositories::{customers::CustomerRepository, payment_sessions::PaymentSessionRepository},
        value_objects::{
            enums::{
                customer_plans::CustomerPlan, session_statuses::SessionStatus,
                subscription_statuses::SubscriptionStatus,
            },
            plans::PlanCatalog,
        },
    },
    usecases::gateway::StripeGateway,
};

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("unknown plan")]
    UnknownPlan,

    #[error("customer not found")]
    CustomerNotFound,

    #[error("payment session not found")]
    SessionNotFound,

    #[error("no subscription found")]
    SubscriptionNotFound,

    #[error("subscription is not active (status: {status})")]
    InvalidState { status: String },

    #[error("cancellation did not complete (status: {status})")]
    CancelFailed { status: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SubscriptionError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            SubscriptionError::UnknownPlan | SubscriptionError::InvalidState { .. } => {
                StatusCode::BAD_REQUEST
            }
            SubscriptionError::CustomerNotFound
            | SubscriptionError::SessionNotFound
            | SubscriptionError::SubscriptionNotFound => StatusCode::NOT_FOUND,
            SubscriptionError::CancelFailed { .. } | SubscriptionError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub type SubscriptionResult<T> = std::result::Result<T, SubscriptionError>;

#[derive(Debug, Clone)]
pub struct CreatedSubscriptionDto {
    pub subscription_id: String,
    pub session_id: Uuid,
    pub client_secret: String,
}

pub struct SubscriptionUseCase<Cust, Sess, Stripe>
where
    Cust: CustomerRepository + Send + Sync + 'static,
    Sess: PaymentSessionRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    customer_repo: Arc<Cust>,
    session_repo: Arc<Sess>,
    stripe_client: Arc<Stripe>,
    plan_catalog: PlanCatalog,
}

impl<Cust, Sess, Stripe> SubscriptionUseCase<Cust, Sess, Stripe>
where
    Cust: CustomerRepository + Send + Sync + 'static,
    Sess: PaymentSessionRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    pub fn new(
        customer_repo: Arc<Cust>,
        session_repo: Arc<Sess>,
        stripe_client: Arc<Stripe>,
        plan_catalog: PlanCatalog,
    ) -> Self {
        Self {
            customer_repo,
            session_repo,
            stripe_client,
            plan_catalog,
        }
    }

    /// Starts a subscription checkout: the subscription is created
    /// `incomplete` at the gateway and the client confirms the expanded
    /// invoice's payment intent out-of-band. Activation is observed later via
    /// `confirm_subscription`.
    pub async fn create_subscription(
        &self,
        plan_id: &str,
        user_id: &str,
    ) -> SubscriptionResult<CreatedSubscriptionDto> {
        let price_id = self
            .plan_catalog
            .resolve_price_id(plan_id)
            .ok_or_else(|| {
                warn!(plan_id, user_id, "subscriptions: unknown plan requested");
                SubscriptionError::UnknownPlan
            })?
            .to_string();

        let customer_id = self.resolve_stripe_customer(user_id).await?;

        let metadata = HashMap::from([
            ("user_id".to_string(), user_id.to_string()),
            ("plan_id".to_string(), plan_id.to_string()),
        ]);

        info!(
            user_id,
            plan_id,
            price_id = %price_id,
            customer_id = %customer_id,
            "subscriptions: creating incomplete subscription"
        );

        let subscription = self
            .stripe_client
            .create_incomplete_subscription(&customer_id, &price_id, metadata)
            .await
            .map_err(|err| {
                error!(
                    user_id,
                    plan_id,
                    error = ?err,
                    "subscriptions: stripe subscription creation failed"
                );
                SubscriptionError::Internal(err)
            })?;

        let client_secret = subscription
            .latest_invoice_client_secret()
            .ok_or_else(|| {
                SubscriptionError::Internal(anyhow::anyhow!(
                    "subscription invoice payment intent secret is missing"
                ))
            })?
            .to_string();

        let session_id = self
            .session_repo
            .insert(NewPaymentSessionEntity {
                user_id: user_id.to_string(),
                subscription_id: subscription.id.clone(),
                plan_id: plan_id.to_string(),
                status: SessionStatus::Pending.to_string(),
            })
            .await
            .map_err(|err| {
                error!(
                    user_id,
                    subscription_id = %subscription.id,
                    db_error = ?err,
                    "subscriptions: failed to store payment session"
                );
                SubscriptionError::Internal(err)
            })?;

        info!(
            user_id,
            plan_id,
            subscription_id = %subscription.id,
            %session_id,
            "subscriptions: checkout session prepared"
        );

        Ok(CreatedSubscriptionDto {
            subscription_id: subscription.id,
            session_id,
            client_secret,
        })
    }

    /// Success-callback flow after the client confirmed payment. Two
    /// idempotent mutations: complete the session, then set the customer
    /// plan. Reloading the success page re-runs both safely.
    pub async fn confirm_subscription(
        &self,
        session_id: Uuid,
        user_id: &str,
    ) -> SubscriptionResult<()> {
        let session = self
            .session_repo
            .find_by_id(session_id)
            .await
            .map_err(|err| {
                error!(%session_id, db_error = ?err, "subscriptions: failed to load session");
                SubscriptionError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%session_id, "subscriptions: unknown payment session");
                SubscriptionError::SessionNotFound
            })?;

        if session.user_id != user_id {
            warn!(
                %session_id,
                user_id,
                "subscriptions: session does not belong to caller"
            );
            return Err(SubscriptionError::SessionNotFound);
        }

        self.session_repo
            .mark_completed(session_id)
            .await
            .map_err(|err| {
                error!(%session_id, db_error = ?err, "subscriptions: failed to complete session");
                SubscriptionError::Internal(err)
            })?;

        let plan = CustomerPlan::for_plan_id(&session.plan_id);
        self.customer_repo
            .set_plan(user_id, plan)
            .await
            .map_err(|err| {
                error!(
                    %session_id,
                    user_id,
                    plan = %plan,
                    db_error = ?err,
                    "subscriptions: failed to set customer plan"
                );
                SubscriptionError::Internal(err)
            })?;

        info!(%session_id, user_id, plan = %plan, "subscriptions: checkout confirmed");
        Ok(())
    }

    /// Cancels immediately. Only `active` subscriptions may be canceled; the
    /// observed gateway status is carried in the error for diagnosis.
    pub async fn cancel_subscription(&self, subscription_id: &str) -> SubscriptionResult<()> {
        let subscription = self
            .stripe_client
            .retrieve_subscription(subscription_id)
            .await
            .map_err(|err| {
                error!(
                    subscription_id,
                    error = ?err,
                    "subscriptions: failed to retrieve subscription before cancel"
                );
                SubscriptionError::Internal(err)
            })?;

        if SubscriptionStatus::from_str(&subscription.status) != Some(SubscriptionStatus::Active) {
            let err = SubscriptionError::InvalidState {
                status: subscription.status.clone(),
            };
            warn!(
                subscription_id,
                current_status = %subscription.status,
                status = err.status_code().as_u16(),
                "subscriptions: cancel rejected for non-active subscription"
            );
            return Err(err);
        }

        let resulting_status = self
            .stripe_client
            .cancel_subscription_now(subscription_id)
            .await
            .map_err(|err| {
                error!(
                    subscription_id,
                    error = ?err,
                    "subscriptions: stripe cancel subscription failed"
                );
                SubscriptionError::Internal(err)
            })?;

        if SubscriptionStatus::from_str(&resulting_status) != Some(SubscriptionStatus::Canceled) {
            error!(
                subscription_id,
                resulting_status = %resulting_status,
                "subscriptions: gateway did not report canceled status"
            );
            return Err(SubscriptionError::CancelFailed {
                status: resulting_status,
            });
        }

        info!(subscription_id, "subscriptions: subscription canceled");
        Ok(())
    }

    /// Looks up the caller's active subscription through gateway metadata.
    pub async fn get_subscription(&self, user_id: &str) -> SubscriptionResult<String> {
        let customer_id = match self.find_stripe_customer(user_id).await? {
            Some(customer_id) => customer_id,
            None => {
                info!(user_id, "subscriptions: no gateway customer for user");
                return Err(SubscriptionError::SubscriptionNotFound);
            }
        };

        let subscriptions = self
            .stripe_client
            .list_active_subscriptions(&customer_id)
            .await
            .map_err(|err| {
                error!(
                    user_id,
                    customer_id = %customer_id,
                    error = ?err,
                    "subscriptions: failed to list subscriptions"
                );
                SubscriptionError::Internal(err)
            })?;

        subscriptions
            .into_iter()
            .find(|subscription| {
                subscription
                    .metadata
                    .get("user_id")
                    .is_some_and(|value| value == user_id)
            })
            .map(|subscription| subscription.id)
            .ok_or_else(|| {
                info!(user_id, "subscriptions: no active subscription for user");
                SubscriptionError::SubscriptionNotFound
            })
    }

    pub async fn update_subscription_metadata(
        &self,
        subscription_id: &str,
        user_id: &str,
        plan_id: &str,
    ) -> SubscriptionResult<()> {
        let metadata = HashMap::from([
            ("user_id".to_string(), user_id.to_string()),
            ("plan_id".to_string(), plan_id.to_string()),
        ]);

        self.stripe_client
            .update_subscription_metadata(subscription_id, metadata)
            .await
            .map_err(|err| {
                error!(
                    subscription_id,
                    user_id,
                    error = ?err,
                    "subscriptions: failed to update subscription metadata"
                );
                SubscriptionError::Internal(err)
            })?;

        info!(subscription_id, user_id, plan_id, "subscriptions: metadata updated");
        Ok(())
    }

    /// Stripe customer id for the user: cached on the customer record,
    /// otherwise found by metadata search or created, then cached.
    async fn resolve_stripe_customer(&self, user_id: &str) -> SubscriptionResult<String> {
        let customer = self
            .customer_repo
            .find_by_user_id(user_id)
            .await
            .map_err(|err| {
                error!(user_id, db_error = ?err, "subscriptions: failed to load customer record");
                SubscriptionError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(user_id, "subscriptions: no customer record for user");
                SubscriptionError::CustomerNotFound
            })?;

        if let Some(stripe_customer_id) = customer.stripe_customer_id {
            return Ok(stripe_customer_id);
        }

        let found = self
            .stripe_client
            .find_customer_by_user_id(user_id)
            .await
            .map_err(|err| {
                error!(user_id, error = ?err, "subscriptions: customer search failed");
                SubscriptionError::Internal(err)
            })?;

        let stripe_customer_id = match found {
            Some(id) => id,
            None => self
                .stripe_client
                .create_customer(&customer.email, user_id)
                .await
                .map_err(|err| {
                    error!(user_id, error = ?err, "subscriptions: customer creation failed");
                    SubscriptionError::Internal(err)
                })?,
        };

        self.customer_repo
            .set_stripe_customer_id(user_id, &stripe_customer_id)
            .await
            .map_err(|err| {
                error!(
                    user_id,
                    stripe_customer_id = %stripe_customer_id,
                    db_error = ?err,
                    "subscriptions: failed to cache stripe customer id"
                );
                SubscriptionError::Internal(err)
            })?;

        Ok(stripe_customer_id)
    }

    async fn find_stripe_customer(&self, user_id: &str) -> SubscriptionResult<Option<String>> {
        let cached = self
            .customer_repo
            .find_by_user_id(user_id)
            .await
            .map_err(|err| {
                error!(user_id, db_error = ?err, "subscriptions: failed to load customer record");
                SubscriptionError::Internal(err)
            })?
            .and_then(|customer| customer.stripe_customer_id);

        if cached.is_some() {
            return Ok(cached);
        }

        self.stripe_client
            .find_customer_by_user_id(user_id)
            .await
            .map_err(|err| {
                error!(user_id, error = ?err, "subscriptions: customer search failed");
                SubscriptionError::Internal(err)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            entities::{customers::CustomerEntity, payment_sessions::PaymentSessionEntity},
            repositories::{
                customers::MockCustomerRepository, payment_sessions::MockPaymentSessionRepository,
            },
            value_objects::plans::GOLDEN_MONTHLY_PLAN_ID,
        },
        payments::stripe_client::{StripeInvoice, StripePaymentIntent, StripeSubscription},
        usecases::gateway::MockStripeGateway,
    };
    use chrono::Utc;
    use mockall::predicate::eq;

    fn catalog() -> PlanCatalog {
        PlanCatalog::new("price_monthly".to_string(), "price_yearly".to_string())
    }

    fn customer(user_id: &str, stripe_customer_id: Option<&str>) -> CustomerEntity {
        CustomerEntity {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            email: "driver@example.com".to_string(),
            stripe_customer_id: stripe_customer_id.map(str::to_string),
            plan: CustomerPlan::Standard.to_string(),
            created_at: Utc::now(),
        }
    }

    fn session(id: Uuid, user_id: &str, plan_id: &str) -> PaymentSessionEntity {
        PaymentSessionEntity {
            id,
            user_id: user_id.to_string(),
            subscription_id: "sub_1".to_string(),
            plan_id: plan_id.to_string(),
            status: SessionStatus::Pending.to_string(),
            created_at: Utc::now(),
        }
    }

    fn incomplete_subscription(id: &str, secret: &str) -> StripeSubscription {
        StripeSubscription {
            id: id.to_string(),
            status: SubscriptionStatus::Incomplete.to_string(),
            metadata: HashMap::new(),
            latest_invoice: Some(StripeInvoice {
                payment_intent: Some(StripePaymentIntent {
                    id: "pi_sub".to_string(),
                    client_secret: Some(secret.to_string()),
                }),
            }),
        }
    }

    fn usecase(
        customer_repo: MockCustomerRepository,
        session_repo: MockPaymentSessionRepository,
        stripe: MockStripeGateway,
    ) -> SubscriptionUseCase<MockCustomerRepository, MockPaymentSessionRepository, MockStripeGateway>
    {
        SubscriptionUseCase::new(
            Arc::new(customer_repo),
            Arc::new(session_repo),
            Arc::new(stripe),
            catalog(),
        )
    }

    #[tokio::test]
    async fn unknown_plans_are_rejected_before_any_gateway_call() {
        let customer_repo = MockCustomerRepository::new();
        let session_repo = MockPaymentSessionRepository::new();
        let mut stripe = MockStripeGateway::new();

        stripe.expect_create_incomplete_subscription().times(0);
        stripe.expect_find_customer_by_user_id().times(0);
        stripe.expect_create_customer().times(0);

        let usecase = usecase(customer_repo, session_repo, stripe);

        let err = usecase
            .create_subscription("not_a_real_plan", "user_1")
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::UnknownPlan));
    }

    #[tokio::test]
    async fn creating_a_subscription_returns_the_invoice_client_secret() {
        let mut customer_repo = MockCustomerRepository::new();
        let mut session_repo = MockPaymentSessionRepository::new();
        let mut stripe = MockStripeGateway::new();

        customer_repo
            .expect_find_by_user_id()
            .with(eq("user_1"))
            .returning(|user_id| {
                let customer = customer(user_id, Some("cus_1"));
                Box::pin(async move { Ok(Some(customer)) })
            });
        stripe
            .expect_create_incomplete_subscription()
            .withf(|customer_id, price_id, metadata| {
                customer_id == "cus_1"
                    && price_id == "price_monthly"
                    && metadata.get("user_id").map(String::as_str) == Some("user_1")
            })
            .times(1)
            .returning(|_, _, _| {
                Box::pin(async { Ok(incomplete_subscription("sub_1", "pi_sub_secret")) })
            });
        session_repo
            .expect_insert()
            .withf(|new_session| {
                new_session.subscription_id == "sub_1" && new_session.status == "pending"
            })
            .times(1)
            .returning(|_| Box::pin(async { Ok(Uuid::new_v4()) }));

        let usecase = usecase(customer_repo, session_repo, stripe);

        let created = usecase
            .create_subscription(GOLDEN_MONTHLY_PLAN_ID, "user_1")
            .await
            .unwrap();

        assert_eq!(created.subscription_id, "sub_1");
        assert_eq!(created.client_secret, "pi_sub_secret");
    }

    #[tokio::test]
    async fn confirming_twice_sets_the_plan_both_times_without_stacking() {
        let session_id = Uuid::new_v4();

        let mut customer_repo = MockCustomerRepository::new();
        let mut session_repo = MockPaymentSessionRepository::new();
        let stripe = MockStripeGateway::new();

        session_repo
            .expect_find_by_id()
            .with(eq(session_id))
            .returning(move |id| {
                let session = session(id, "user_1", GOLDEN_MONTHLY_PLAN_ID);
                Box::pin(async move { Ok(Some(session)) })
            });
        session_repo
            .expect_mark_completed()
            .with(eq(session_id))
            .times(2)
            .returning(|_| Box::pin(async { Ok(()) }));
        // Upgrade is a SET: the same target plan on every run.
        customer_repo
            .expect_set_plan()
            .with(eq("user_1"), eq(CustomerPlan::Golden))
            .times(2)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let usecase = usecase(customer_repo, session_repo, stripe);

        usecase
            .confirm_subscription(session_id, "user_1")
            .await
            .unwrap();
        usecase
            .confirm_subscription(session_id, "user_1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn canceling_a_non_active_subscription_is_invalid_state() {
        let customer_repo = MockCustomerRepository::new();
        let session_repo = MockPaymentSessionRepository::new();
        let mut stripe = MockStripeGateway::new();

        stripe
            .expect_retrieve_subscription()
            .with(eq("sub_dead"))
            .returning(|id| {
                let id = id.to_string();
                Box::pin(async move {
                    Ok(StripeSubscription {
                        id,
                        status: "canceled".to_string(),
                        metadata: HashMap::new(),
                        latest_invoice: None,
                    })
                })
            });
        stripe.expect_cancel_subscription_now().times(0);

        let usecase = usecase(customer_repo, session_repo, stripe);

        let err = usecase.cancel_subscription("sub_dead").await.unwrap_err();
        match err {
            SubscriptionError::InvalidState { status } => assert_eq!(status, "canceled"),
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancel_fails_when_the_gateway_reports_a_non_canceled_status() {
        let customer_repo = MockCustomerRepository::new();
        let session_repo = MockPaymentSessionRepository::new();
        let mut stripe = MockStripeGateway::new();

        stripe.expect_retrieve_subscription().returning(|id| {
            let id = id.to_string();
            Box::pin(async move {
                Ok(StripeSubscription {
                    id,
                    status: "active".to_string(),
                    metadata: HashMap::new(),
                    latest_invoice: None,
                })
            })
        });
        stripe
            .expect_cancel_subscription_now()
            .times(1)
            .returning(|_| Box::pin(async { Ok("active".to_string()) }));

        let usecase = usecase(customer_repo, session_repo, stripe);

        let err = usecase.cancel_subscription("sub_stuck").await.unwrap_err();
        assert!(matches!(err, SubscriptionError::CancelFailed { .. }));
    }

    #[tokio::test]
    async fn get_subscription_matches_on_user_metadata() {
        let mut customer_repo = MockCustomerRepository::new();
        let session_repo = MockPaymentSessionRepository::new();
        let mut stripe = MockStripeGateway::new();

        customer_repo.expect_find_by_user_id().returning(|user_id| {
            let customer = customer(user_id, Some("cus_1"));
            Box::pin(async move { Ok(Some(customer)) })
        });
        stripe
            .expect_list_active_subscriptions()
            .with(eq("cus_1"))
            .returning(|_| {
                Box::pin(async {
                    Ok(vec![
                        StripeSubscription {
                            id: "sub_other".to_string(),
                            status: "active".to_string(),
                            metadata: HashMap::from([(
                                "user_id".to_string(),
                                "someone_else".to_string(),
                            )]),
                            latest_invoice: None,
                        },
                        StripeSubscription {
                            id: "sub_mine".to_string(),
                            status: "active".to_string(),
                            metadata: HashMap::from([(
                                "user_id".to_string(),
                                "user_1".to_string(),
                            )]),
                            latest_invoice: None,
                        },
                    ])
                })
            });

        let usecase = usecase(customer_repo, session_repo, stripe);

        let subscription_id = usecase.get_subscription("user_1").await.unwrap();
        assert_eq!(subscription_id, "sub_mine");
    }

    #[tokio::test]
    async fn get_subscription_without_a_customer_is_not_found() {
        let mut customer_repo = MockCustomerRepository::new();
        let session_repo = MockPaymentSessionRepository::new();
        let mut stripe = MockStripeGateway::new();

        customer_repo
            .expect_find_by_user_id()
            .returning(|_| Box::pin(async { Ok(None) }));
        stripe
            .expect_find_customer_by_user_id()
            .returning(|_| Box::pin(async { Ok(None) }));
        stripe.expect_list_active_subscriptions().times(0);

        let usecase = usecase(customer_repo, session_repo, stripe);

        let err = usecase.get_subscription("ghost").await.unwrap_err();
        assert!(matches!(err, SubscriptionError::SubscriptionNotFound));
    }
}
