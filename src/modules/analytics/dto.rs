use serde::{Deserialize, Serialize};
use time::Date;
use utoipa::{IntoParams, ToSchema};

/// Query-string filter shared by the analytics endpoints. Dates are
/// `YYYY-MM-DD`; both default to the trailing 30 days.
#[derive(Debug, Deserialize, IntoParams)]
pub struct AnalyticsQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub platform: Option<String>,
}

/// Resolved, validated form of [`AnalyticsQuery`].
#[derive(Debug, Clone)]
pub struct AnalyticsRange {
    pub from: Date,
    pub to: Date,
    pub platform: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlatformBreakdown {
    pub platform: String,
    pub views: i64,
    pub likes: i64,
    pub shares: i64,
    pub comments: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OverviewResponse {
    pub total_views: i64,
    pub total_likes: i64,
    pub total_shares: i64,
    pub total_comments: i64,
    pub platforms: Vec<PlatformBreakdown>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TimeseriesPoint {
    #[schema(value_type = String, format = Date)]
    pub day: Date,
    pub views: i64,
}
