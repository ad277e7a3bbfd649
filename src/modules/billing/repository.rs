use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::Subscription;

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, stripe_customer_id, stripe_subscription_id, \
     plan, status, current_period_end, created_at, updated_at";

pub struct BillingRepository;

impl BillingRepository {
    pub async fn find_by_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<Subscription>, sqlx::Error> {
        sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// One subscription row per user; plan changes overwrite in place.
    pub async fn upsert(
        pool: &PgPool,
        user_id: Uuid,
        stripe_customer_id: &str,
        stripe_subscription_id: Option<&str>,
        plan: &str,
        status: &str,
        current_period_end: Option<OffsetDateTime>,
    ) -> Result<Subscription, sqlx::Error> {
        sqlx::query_as::<_, Subscription>(&format!(
            "INSERT INTO subscriptions \
                 (user_id, stripe_customer_id, stripe_subscription_id, plan, status, current_period_end) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 stripe_customer_id = EXCLUDED.stripe_customer_id, \
                 stripe_subscription_id = EXCLUDED.stripe_subscription_id, \
                 plan = EXCLUDED.plan, \
                 status = EXCLUDED.status, \
                 current_period_end = EXCLUDED.current_period_end, \
                 updated_at = NOW() \
             RETURNING {SUBSCRIPTION_COLUMNS}"
        ))
        .bind(user_id)
        .bind(stripe_customer_id)
        .bind(stripe_subscription_id)
        .bind(plan)
        .bind(status)
        .bind(current_period_end)
        .fetch_one(pool)
        .await
    }

    pub async fn set_status(
        pool: &PgPool,
        user_id: Uuid,
        status: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE subscriptions SET status = $1, updated_at = NOW() WHERE user_id = $2",
        )
        .bind(status)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
