use time::{Date, Duration, OffsetDateTime, macros::format_description};
use uuid::Uuid;

use super::dto::{AnalyticsQuery, AnalyticsRange, OverviewResponse, TimeseriesPoint};
use super::repository::AnalyticsRepository;
use crate::common::error::{ServiceError, ServiceResult};
use crate::state::AppState;

const DEFAULT_WINDOW_DAYS: i64 = 30;

pub struct AnalyticsService;

impl AnalyticsService {
    fn parse_date(value: &str, field: &str) -> ServiceResult<Date> {
        let format = format_description!("[year]-[month]-[day]");
        Date::parse(value, &format)
            .map_err(|_| ServiceError::Validation(format!("{field} must be YYYY-MM-DD")))
    }

    /// Resolve the query into a concrete range: trailing 30 days by default,
    /// and `from > to` is rejected before any query runs.
    pub fn resolve_range(query: AnalyticsQuery) -> ServiceResult<AnalyticsRange> {
        let today = OffsetDateTime::now_utc().date();
        let to = match &query.to {
            Some(value) => Self::parse_date(value, "to")?,
            None => today,
        };
        let from = match &query.from {
            Some(value) => Self::parse_date(value, "from")?,
            None => to - Duration::days(DEFAULT_WINDOW_DAYS),
        };

        if from > to {
            return Err(ServiceError::Validation(
                "from must not be after to".to_string(),
            ));
        }

        Ok(AnalyticsRange {
            from,
            to,
            platform: query.platform,
        })
    }

    pub async fn overview(
        state: AppState,
        user_id: Uuid,
        query: AnalyticsQuery,
    ) -> ServiceResult<OverviewResponse> {
        let range = Self::resolve_range(query)?;
        let platforms = AnalyticsRepository::platform_breakdown(&state.db, user_id, &range).await?;

        Ok(OverviewResponse {
            total_views: platforms.iter().map(|p| p.views).sum(),
            total_likes: platforms.iter().map(|p| p.likes).sum(),
            total_shares: platforms.iter().map(|p| p.shares).sum(),
            total_comments: platforms.iter().map(|p| p.comments).sum(),
            platforms,
        })
    }

    pub async fn timeseries(
        state: AppState,
        user_id: Uuid,
        query: AnalyticsQuery,
    ) -> ServiceResult<Vec<TimeseriesPoint>> {
        let range = Self::resolve_range(query)?;
        Ok(AnalyticsRepository::daily_views(&state.db, user_id, &range).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(from: Option<&str>, to: Option<&str>) -> AnalyticsQuery {
        AnalyticsQuery {
            from: from.map(str::to_string),
            to: to.map(str::to_string),
            platform: None,
        }
    }

    #[test]
    fn defaults_to_trailing_thirty_days() {
        let range = AnalyticsService::resolve_range(query(None, None)).unwrap();
        assert_eq!(range.to - range.from, Duration::days(DEFAULT_WINDOW_DAYS));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let result = AnalyticsService::resolve_range(query(Some("2026-08-20"), Some("2026-08-01")));
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn malformed_date_is_rejected() {
        let result = AnalyticsService::resolve_range(query(Some("20-08-2026"), None));
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn explicit_range_is_kept() {
        let range =
            AnalyticsService::resolve_range(query(Some("2026-08-01"), Some("2026-08-20"))).unwrap();
        assert_eq!(range.to - range.from, Duration::days(19));
    }
}
