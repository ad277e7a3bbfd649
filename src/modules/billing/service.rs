use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::dto::{InvoiceResponse, PaymentMethodResponse, SubscriptionResponse};
use super::model::Plan;
use super::repository::BillingRepository;
use crate::common::error::{ServiceError, ServiceResult};
use crate::infrastructure::stripe::client::StripeClient;
use crate::state::AppState;

/// Stripe-side work a plan change requires. A running subscription is always
/// canceled before a new one is opened, so a switch (or a repeated POST of the
/// same plan) never leaves two live subscriptions billing the customer.
#[derive(Debug, PartialEq, Eq)]
struct PlanTransition {
    cancel: Option<String>,
    create_price_id: Option<&'static str>,
}

fn plan_transition(existing: Option<&super::model::Subscription>, plan: Plan) -> PlanTransition {
    PlanTransition {
        cancel: existing.and_then(|sub| sub.stripe_subscription_id.clone()),
        create_price_id: plan.stripe_price_id(),
    }
}

pub struct BillingService;

impl BillingService {
    fn stripe(state: &AppState) -> ServiceResult<&StripeClient> {
        state
            .stripe
            .as_ref()
            .ok_or_else(|| ServiceError::Billing("STRIPE_SECRET_KEY is not set".to_string()))
    }

    pub async fn get_subscription(
        state: AppState,
        user_id: Uuid,
    ) -> ServiceResult<SubscriptionResponse> {
        let subscription = BillingRepository::find_by_user(&state.db, user_id).await?;
        Ok(subscription
            .as_ref()
            .map(SubscriptionResponse::from)
            .unwrap_or_else(SubscriptionResponse::free))
    }

    /// Create (or reuse) the Stripe customer, cancel whatever subscription is
    /// running, open the new one on Stripe's side, then mirror it locally.
    /// Stripe holds the financial truth; the local row is a cache for the
    /// dashboard.
    pub async fn change_plan(
        state: AppState,
        user_id: Uuid,
        email: Option<String>,
        plan: Plan,
    ) -> ServiceResult<SubscriptionResponse> {
        let stripe = Self::stripe(&state)?;

        let existing = BillingRepository::find_by_user(&state.db, user_id).await?;
        let customer_id = match &existing {
            Some(sub) => sub.stripe_customer_id.clone(),
            None => {
                let email = email.ok_or_else(|| {
                    ServiceError::Validation("an account email is required for billing".to_string())
                })?;
                stripe
                    .create_customer(&email)
                    .await
                    .map_err(|e| ServiceError::Billing(e.to_string()))?
                    .id
            }
        };

        let transition = plan_transition(existing.as_ref(), plan);
        if let Some(sub_id) = &transition.cancel {
            stripe
                .cancel_subscription(sub_id)
                .await
                .map_err(|e| ServiceError::Billing(e.to_string()))?;
        }

        let Some(price_id) = transition.create_price_id else {
            let row = BillingRepository::upsert(
                &state.db,
                user_id,
                &customer_id,
                None,
                Plan::Free.as_str(),
                "active",
                None,
            )
            .await?;
            return Ok(SubscriptionResponse::from(&row));
        };

        let stripe_sub = stripe
            .create_subscription(&customer_id, price_id)
            .await
            .map_err(|e| ServiceError::Billing(e.to_string()))?;

        let period_end = OffsetDateTime::from_unix_timestamp(stripe_sub.current_period_end).ok();
        let row = BillingRepository::upsert(
            &state.db,
            user_id,
            &customer_id,
            Some(&stripe_sub.id),
            plan.as_str(),
            &stripe_sub.status,
            period_end,
        )
        .await?;

        info!(user_id = %user_id, plan = plan.as_str(), "subscription updated");
        Ok(SubscriptionResponse::from(&row))
    }

    pub async fn cancel_subscription(
        state: AppState,
        user_id: Uuid,
    ) -> ServiceResult<SubscriptionResponse> {
        let stripe = Self::stripe(&state)?;
        let subscription = BillingRepository::find_by_user(&state.db, user_id)
            .await?
            .ok_or(ServiceError::NotFound("subscription"))?;

        let Some(sub_id) = &subscription.stripe_subscription_id else {
            return Err(ServiceError::Conflict(
                "no paid subscription to cancel".to_string(),
            ));
        };

        stripe
            .cancel_subscription(sub_id)
            .await
            .map_err(|e| ServiceError::Billing(e.to_string()))?;
        BillingRepository::set_status(&state.db, user_id, "canceled").await?;

        info!(user_id = %user_id, "subscription canceled at period end");
        Self::get_subscription(state, user_id).await
    }

    pub async fn list_invoices(
        state: AppState,
        user_id: Uuid,
    ) -> ServiceResult<Vec<InvoiceResponse>> {
        let stripe = Self::stripe(&state)?;
        let Some(subscription) = BillingRepository::find_by_user(&state.db, user_id).await? else {
            return Ok(vec![]);
        };

        let invoices = stripe
            .list_invoices(&subscription.stripe_customer_id)
            .await
            .map_err(|e| ServiceError::Billing(e.to_string()))?;
        Ok(invoices.into_iter().map(InvoiceResponse::from).collect())
    }

    pub async fn list_payment_methods(
        state: AppState,
        user_id: Uuid,
    ) -> ServiceResult<Vec<PaymentMethodResponse>> {
        let stripe = Self::stripe(&state)?;
        let Some(subscription) = BillingRepository::find_by_user(&state.db, user_id).await? else {
            return Ok(vec![]);
        };

        let methods = stripe
            .list_payment_methods(&subscription.stripe_customer_id)
            .await
            .map_err(|e| ServiceError::Billing(e.to_string()))?;
        Ok(methods
            .into_iter()
            .map(PaymentMethodResponse::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::billing::model::Subscription;

    fn subscription(plan: Plan, stripe_subscription_id: Option<&str>) -> Subscription {
        let now = OffsetDateTime::now_utc();
        Subscription {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            stripe_customer_id: "cus_123".to_string(),
            stripe_subscription_id: stripe_subscription_id.map(str::to_string),
            plan: plan.as_str().to_string(),
            status: "active".to_string(),
            current_period_end: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn upgrade_cancels_the_running_subscription_first() {
        let existing = subscription(Plan::Pro, Some("sub_pro"));
        let transition = plan_transition(Some(&existing), Plan::Business);

        assert_eq!(transition.cancel.as_deref(), Some("sub_pro"));
        assert_eq!(
            transition.create_price_id,
            Plan::Business.stripe_price_id()
        );
    }

    #[test]
    fn repeated_post_of_the_same_plan_never_doubles() {
        let existing = subscription(Plan::Pro, Some("sub_pro"));
        let transition = plan_transition(Some(&existing), Plan::Pro);

        // The old subscription goes away before the replacement is opened,
        // so at most one is ever live.
        assert_eq!(transition.cancel.as_deref(), Some("sub_pro"));
        assert_eq!(transition.create_price_id, Plan::Pro.stripe_price_id());
    }

    #[test]
    fn downgrade_to_free_cancels_and_opens_nothing() {
        let existing = subscription(Plan::Business, Some("sub_biz"));
        let transition = plan_transition(Some(&existing), Plan::Free);

        assert_eq!(transition.cancel.as_deref(), Some("sub_biz"));
        assert_eq!(transition.create_price_id, None);
    }

    #[test]
    fn first_paid_plan_has_nothing_to_cancel() {
        assert_eq!(
            plan_transition(None, Plan::Pro),
            PlanTransition {
                cancel: None,
                create_price_id: Plan::Pro.stripe_price_id(),
            }
        );

        // A free-plan mirror row without a Stripe subscription behaves the
        // same way.
        let free_row = subscription(Plan::Free, None);
        assert_eq!(plan_transition(Some(&free_row), Plan::Pro).cancel, None);
    }
}
