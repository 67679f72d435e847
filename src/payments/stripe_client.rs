use std::collections::HashMap;

use anyhow::Result;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::error;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Minimal Stripe client built on reqwest. One instance is created from
/// configuration and injected into the orchestrator; there is no process-wide
/// singleton.
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripePaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeRefund {
    pub id: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub latest_invoice: Option<StripeInvoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeInvoice {
    pub payment_intent: Option<StripePaymentIntent>,
}

impl StripeSubscription {
    /// Client secret of the expanded latest-invoice payment intent, used by
    /// the browser to confirm an `incomplete` subscription.
    pub fn latest_invoice_client_secret(&self) -> Option<&str> {
        self.latest_invoice
            .as_ref()
            .and_then(|invoice| invoice.payment_intent.as_ref())
            .and_then(|intent| intent.client_secret.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripePaymentMethod {
    pub id: String,
    pub card: Option<StripeCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeCard {
    pub brand: String,
    pub last4: String,
    pub exp_month: u32,
    pub exp_year: u32,
}

#[derive(Debug, Deserialize)]
struct StripeList<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorDetails,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetails {
    #[serde(rename = "type")]
    type_: Option<String>,
    code: Option<String>,
    message: Option<String>,
    param: Option<String>,
    decline_code: Option<String>,
}

impl StripeClient {
    pub fn new(secret_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
        }
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let request_id = resp
            .headers()
            .get("request-id")
            .or_else(|| resp.headers().get("stripe-request-id"))
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let (stripe_error_type, stripe_error_code, stripe_error_param, stripe_error_message, stripe_decline_code) =
            match serde_json::from_str::<StripeErrorEnvelope>(&body) {
                Ok(envelope) => {
                    let details = envelope.error;
                    (
                        details.type_,
                        details.code,
                        details.param,
                        details.message,
                        details.decline_code,
                    )
                }
                Err(_) => (None, None, None, None, None),
            };

        error!(
            status = %status,
            stripe_request_id = ?request_id,
            stripe_error_type = ?stripe_error_type,
            stripe_error_code = ?stripe_error_code,
            stripe_error_param = ?stripe_error_param,
            stripe_error_message = ?stripe_error_message,
            stripe_decline_code = ?stripe_decline_code,
            response_body = %body,
            context = %context,
            "stripe api request failed"
        );

        anyhow::bail!(
            "Stripe API request failed: {} (status {}, request_id={:?})",
            context,
            status,
            request_id
        );
    }

    async fn post_form(
        &self,
        path: &str,
        body: &[(String, String)],
        context: &str,
    ) -> Result<reqwest::Response> {
        let resp = self
            .http
            .post(format!("{STRIPE_API_BASE}{path}"))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(body)
            .send()
            .await?;
        Self::ensure_success(resp, context).await
    }

    async fn get(&self, path: &str, context: &str) -> Result<reqwest::Response> {
        let resp = self
            .http
            .get(format!("{STRIPE_API_BASE}{path}"))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .send()
            .await?;
        Self::ensure_success(resp, context).await
    }

    /// Creates a payment intent for a minor-unit amount.
    /// https://stripe.com/docs/api/payment_intents/create
    pub async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: HashMap<String, String>,
    ) -> Result<StripePaymentIntent> {
        let mut body = vec![
            ("amount".to_string(), amount_minor.to_string()),
            ("currency".to_string(), currency.to_string()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];
        for (key, value) in metadata {
            body.push((format!("metadata[{}]", key), value));
        }

        let resp = self
            .post_form("/payment_intents", &body, "create payment intent")
            .await?;
        let parsed: StripePaymentIntent = resp.json().await?;
        Ok(parsed)
    }

    /// https://stripe.com/docs/api/setup_intents/create
    pub async fn create_setup_intent(&self, customer_id: &str) -> Result<String> {
        let body = vec![("customer".to_string(), customer_id.to_string())];

        let resp = self
            .post_form("/setup_intents", &body, "create setup intent")
            .await?;

        #[derive(Deserialize)]
        struct SetupIntentResp {
            client_secret: Option<String>,
        }

        let parsed: SetupIntentResp = resp.json().await?;
        parsed
            .client_secret
            .ok_or_else(|| anyhow::anyhow!("Stripe setup intent client secret is missing"))
    }

    /// Creates a Stripe customer tagged with the external user id.
    /// https://stripe.com/docs/api/customers/create
    pub async fn create_customer(&self, email: &str, user_id: &str) -> Result<String> {
        let body = vec![
            ("email".to_string(), email.to_string()),
            ("metadata[user_id]".to_string(), user_id.to_string()),
        ];

        let resp = self.post_form("/customers", &body, "create customer").await?;

        #[derive(Deserialize)]
        struct CustomerResp {
            id: String,
        }

        let parsed: CustomerResp = resp.json().await?;
        Ok(parsed.id)
    }

    /// Finds the customer carrying `metadata[user_id]`.
    /// https://stripe.com/docs/api/customers/search
    pub async fn find_customer_by_user_id(&self, user_id: &str) -> Result<Option<String>> {
        let query = format!("metadata['user_id']:'{}'", user_id);
        let resp = self
            .http
            .get(format!("{STRIPE_API_BASE}/customers/search"))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .query(&[("query", query.as_str()), ("limit", "1")])
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "search customer by metadata").await?;

        #[derive(Deserialize)]
        struct CustomerHit {
            id: String,
        }

        let parsed: StripeList<CustomerHit> = resp.json().await?;
        Ok(parsed.data.into_iter().next().map(|hit| hit.id))
    }

    /// Creates a subscription in `incomplete` status and expands the latest
    /// invoice's payment intent so the caller gets a client secret to confirm.
    /// https://stripe.com/docs/api/subscriptions/create
    pub async fn create_incomplete_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
        metadata: HashMap<String, String>,
    ) -> Result<StripeSubscription> {
        let mut body = vec![
            ("customer".to_string(), customer_id.to_string()),
            ("items[0][price]".to_string(), price_id.to_string()),
            (
                "payment_behavior".to_string(),
                "default_incomplete".to_string(),
            ),
            (
                "expand[]".to_string(),
                "latest_invoice.payment_intent".to_string(),
            ),
        ];
        for (key, value) in metadata {
            body.push((format!("metadata[{}]", key), value));
        }

        let resp = self
            .post_form("/subscriptions", &body, "create subscription")
            .await?;
        let parsed: StripeSubscription = resp.json().await?;
        Ok(parsed)
    }

    /// https://stripe.com/docs/api/subscriptions/retrieve
    pub async fn retrieve_subscription(&self, subscription_id: &str) -> Result<StripeSubscription> {
        let resp = self
            .get(
                &format!("/subscriptions/{}", subscription_id),
                "retrieve subscription",
            )
            .await?;
        let parsed: StripeSubscription = resp.json().await?;
        Ok(parsed)
    }

    /// Cancels immediately (not at period end) and returns the resulting
    /// status. https://stripe.com/docs/api/subscriptions/cancel
    pub async fn cancel_subscription_now(&self, subscription_id: &str) -> Result<String> {
        let resp = self
            .http
            .delete(format!("{STRIPE_API_BASE}/subscriptions/{}", subscription_id))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "cancel subscription").await?;

        #[derive(Deserialize)]
        struct CanceledResp {
            status: String,
        }

        let parsed: CanceledResp = resp.json().await?;
        Ok(parsed.status)
    }

    /// https://stripe.com/docs/api/subscriptions/update
    pub async fn update_subscription_metadata(
        &self,
        subscription_id: &str,
        metadata: HashMap<String, String>,
    ) -> Result<()> {
        let body: Vec<(String, String)> = metadata
            .into_iter()
            .map(|(key, value)| (format!("metadata[{}]", key), value))
            .collect();

        self.post_form(
            &format!("/subscriptions/{}", subscription_id),
            &body,
            "update subscription metadata",
        )
        .await?;

        Ok(())
    }

    /// Active subscriptions of a customer.
    /// https://stripe.com/docs/api/subscriptions/list
    pub async fn list_active_subscriptions(
        &self,
        customer_id: &str,
    ) -> Result<Vec<StripeSubscription>> {
        let resp = self
            .http
            .get(format!("{STRIPE_API_BASE}/subscriptions"))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .query(&[("customer", customer_id), ("status", "active")])
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "list subscriptions").await?;

        let parsed: StripeList<StripeSubscription> = resp.json().await?;
        Ok(parsed.data)
    }

    /// Refunds the full captured amount of a payment intent.
    /// https://stripe.com/docs/api/refunds/create
    pub async fn refund_payment_intent(&self, payment_intent_id: &str) -> Result<StripeRefund> {
        let body = vec![(
            "payment_intent".to_string(),
            payment_intent_id.to_string(),
        )];

        let resp = self.post_form("/refunds", &body, "create refund").await?;
        let parsed: StripeRefund = resp.json().await?;
        Ok(parsed)
    }

    /// Saved card payment methods of a customer.
    /// https://stripe.com/docs/api/payment_methods/customer_list
    pub async fn list_payment_methods(&self, customer_id: &str) -> Result<Vec<StripePaymentMethod>> {
        let resp = self
            .get(
                &format!("/customers/{}/payment_methods?type=card", customer_id),
                "list payment methods",
            )
            .await?;
        let parsed: StripeList<StripePaymentMethod> = resp.json().await?;
        Ok(parsed.data)
    }

    /// Default payment method from the customer's invoice settings.
    /// https://stripe.com/docs/api/customers/retrieve
    pub async fn default_payment_method(&self, customer_id: &str) -> Result<Option<String>> {
        let resp = self
            .get(&format!("/customers/{}", customer_id), "retrieve customer")
            .await?;

        #[derive(Deserialize)]
        struct CustomerResp {
            invoice_settings: Option<InvoiceSettings>,
        }

        #[derive(Deserialize)]
        struct InvoiceSettings {
            default_payment_method: Option<String>,
        }

        let parsed: CustomerResp = resp.json().await?;
        Ok(parsed
            .invoice_settings
            .and_then(|settings| settings.default_payment_method))
    }

    /// https://stripe.com/docs/api/payment_methods/detach
    pub async fn detach_payment_method(&self, payment_method_id: &str) -> Result<()> {
        self.post_form(
            &format!("/payment_methods/{}/detach", payment_method_id),
            &[],
            "detach payment method",
        )
        .await?;

        Ok(())
    }
}
