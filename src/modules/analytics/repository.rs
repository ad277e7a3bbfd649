use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

use super::dto::{AnalyticsRange, PlatformBreakdown, TimeseriesPoint};

pub struct AnalyticsRepository;

#[derive(Debug, sqlx::FromRow)]
struct BreakdownRow {
    platform: String,
    views: i64,
    likes: i64,
    shares: i64,
    comments: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct TimeseriesRow {
    day: Date,
    views: i64,
}

impl AnalyticsRepository {
    pub async fn platform_breakdown(
        pool: &PgPool,
        user_id: Uuid,
        range: &AnalyticsRange,
    ) -> Result<Vec<PlatformBreakdown>, sqlx::Error> {
        let rows = sqlx::query_as::<_, BreakdownRow>(
            "SELECT platform, \
                    COALESCE(SUM(views), 0)::BIGINT AS views, \
                    COALESCE(SUM(likes), 0)::BIGINT AS likes, \
                    COALESCE(SUM(shares), 0)::BIGINT AS shares, \
                    COALESCE(SUM(comments), 0)::BIGINT AS comments \
             FROM content_metrics \
             WHERE user_id = $1 \
               AND recorded_on BETWEEN $2 AND $3 \
               AND ($4::TEXT IS NULL OR platform = $4) \
             GROUP BY platform \
             ORDER BY views DESC",
        )
        .bind(user_id)
        .bind(range.from)
        .bind(range.to)
        .bind(&range.platform)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| PlatformBreakdown {
                platform: r.platform,
                views: r.views,
                likes: r.likes,
                shares: r.shares,
                comments: r.comments,
            })
            .collect())
    }

    pub async fn daily_views(
        pool: &PgPool,
        user_id: Uuid,
        range: &AnalyticsRange,
    ) -> Result<Vec<TimeseriesPoint>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TimeseriesRow>(
            "SELECT recorded_on AS day, COALESCE(SUM(views), 0)::BIGINT AS views \
             FROM content_metrics \
             WHERE user_id = $1 \
               AND recorded_on BETWEEN $2 AND $3 \
               AND ($4::TEXT IS NULL OR platform = $4) \
             GROUP BY recorded_on \
             ORDER BY recorded_on ASC",
        )
        .bind(user_id)
        .bind(range.from)
        .bind(range.to)
        .bind(&range.platform)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| TimeseriesPoint {
                day: r.day,
                views: r.views,
            })
            .collect())
    }
}
