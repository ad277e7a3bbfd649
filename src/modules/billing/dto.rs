use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use super::model::{Plan, Subscription};
use crate::infrastructure::stripe::client::{StripeInvoice, StripePaymentMethod};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePlanRequest {
    pub plan: Plan,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionResponse {
    pub plan: Plan,
    pub status: String,
    #[serde(with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub current_period_end: Option<OffsetDateTime>,
}

impl SubscriptionResponse {
    /// Users without a row are on the implicit free plan.
    pub fn free() -> Self {
        Self {
            plan: Plan::Free,
            status: "active".to_string(),
            current_period_end: None,
        }
    }
}

impl From<&Subscription> for SubscriptionResponse {
    fn from(sub: &Subscription) -> Self {
        Self {
            plan: sub.plan(),
            status: sub.status.clone(),
            current_period_end: sub.current_period_end,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceResponse {
    pub id: String,
    pub status: Option<String>,
    pub amount_due_cents: i64,
    pub currency: String,
    pub hosted_invoice_url: Option<String>,
    pub created_unix: i64,
}

impl From<StripeInvoice> for InvoiceResponse {
    fn from(invoice: StripeInvoice) -> Self {
        Self {
            id: invoice.id,
            status: invoice.status,
            amount_due_cents: invoice.amount_due,
            currency: invoice.currency,
            hosted_invoice_url: invoice.hosted_invoice_url,
            created_unix: invoice.created,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentMethodResponse {
    pub id: String,
    pub brand: Option<String>,
    pub last4: Option<String>,
    pub exp_month: Option<u8>,
    pub exp_year: Option<u16>,
}

impl From<StripePaymentMethod> for PaymentMethodResponse {
    fn from(method: StripePaymentMethod) -> Self {
        let card = method.card;
        Self {
            id: method.id,
            brand: card.as_ref().map(|c| c.brand.clone()),
            last4: card.as_ref().map(|c| c.last4.clone()),
            exp_month: card.as_ref().map(|c| c.exp_month),
            exp_year: card.as_ref().map(|c| c.exp_year),
        }
    }
}
