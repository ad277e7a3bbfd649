use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Pro,
    Business,
}

impl Plan {
    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Pro => "pro",
            Plan::Business => "business",
        }
    }

    /// Stripe price backing each paid plan.
    pub fn stripe_price_id(self) -> Option<&'static str> {
        match self {
            Plan::Free => None,
            Plan::Pro => Some("price_burstlet_pro_monthly"),
            Plan::Business => Some("price_burstlet_business_monthly"),
        }
    }
}

impl From<&str> for Plan {
    fn from(s: &str) -> Self {
        match s {
            "pro" => Plan::Pro,
            "business" => Plan::Business,
            _ => Plan::Free,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub stripe_customer_id: String,
    pub stripe_subscription_id: Option<String>,
    pub plan: String,
    pub status: String,
    pub current_period_end: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Subscription {
    pub fn plan(&self) -> Plan {
        Plan::from(self.plan.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_plan_has_no_stripe_price() {
        assert!(Plan::Free.stripe_price_id().is_none());
        assert!(Plan::Pro.stripe_price_id().is_some());
        assert!(Plan::Business.stripe_price_id().is_some());
    }

    #[test]
    fn unknown_plan_text_degrades_to_free() {
        assert_eq!(Plan::from("enterprise"), Plan::Free);
    }
}
