//! Thin Stripe REST client. Financial processing stays on Stripe's side; this
//! only creates/cancels subscriptions and reads invoices and payment methods.
//! Stripe's API is form-encoded on the way in, JSON on the way out.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

const API_BASE: &str = "https://api.stripe.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    #[error("stripe returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("stripe request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct StripeClient {
    secret_key: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("secret_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeCustomer {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub status: String,
    pub current_period_end: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeInvoice {
    pub id: String,
    pub status: Option<String>,
    pub amount_due: i64,
    pub currency: String,
    pub hosted_invoice_url: Option<String>,
    pub created: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeCard {
    pub brand: String,
    pub last4: String,
    pub exp_month: u8,
    pub exp_year: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripePaymentMethod {
    pub id: String,
    pub card: Option<StripeCard>,
}

#[derive(Debug, Deserialize)]
struct List<T> {
    data: Vec<T>,
}

impl StripeClient {
    pub fn new(secret_key: String) -> Self {
        Self::with_base(secret_key, API_BASE.to_string())
    }

    pub fn with_base(secret_key: String, api_base: String) -> Self {
        Self {
            secret_key: SecretString::from(secret_key),
            api_base,
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, StripeError> {
        debug!(path, "stripe request");
        let response = self
            .client
            .post(format!("{}{path}", self.api_base))
            .basic_auth(self.secret_key.expose_secret(), None::<&str>)
            .form(form)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, StripeError> {
        debug!(path, "stripe request");
        let response = self
            .client
            .get(format!("{}{path}", self.api_base))
            .basic_auth(self.secret_key.expose_secret(), None::<&str>)
            .query(query)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn read_json<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, StripeError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StripeError::Api { status, body });
        }
        Ok(response.json().await?)
    }

    pub async fn create_customer(&self, email: &str) -> Result<StripeCustomer, StripeError> {
        self.post_form("/customers", &[("email", email.to_string())])
            .await
    }

    pub async fn create_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
    ) -> Result<StripeSubscription, StripeError> {
        self.post_form(
            "/subscriptions",
            &[
                ("customer", customer_id.to_string()),
                ("items[0][price]", price_id.to_string()),
            ],
        )
        .await
    }

    pub async fn cancel_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<StripeSubscription, StripeError> {
        self.post_form(
            &format!("/subscriptions/{subscription_id}"),
            &[("cancel_at_period_end", "true".to_string())],
        )
        .await
    }

    pub async fn list_invoices(
        &self,
        customer_id: &str,
    ) -> Result<Vec<StripeInvoice>, StripeError> {
        let list: List<StripeInvoice> = self
            .get("/invoices", &[("customer", customer_id.to_string())])
            .await?;
        Ok(list.data)
    }

    pub async fn list_payment_methods(
        &self,
        customer_id: &str,
    ) -> Result<Vec<StripePaymentMethod>, StripeError> {
        let list: List<StripePaymentMethod> = self
            .get(
                "/payment_methods",
                &[
                    ("customer", customer_id.to_string()),
                    ("type", "card".to_string()),
                ],
            )
            .await?;
        Ok(list.data)
    }
}
