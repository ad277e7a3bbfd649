use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::providers::Capability;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Video,
    Blog,
    Social,
}

impl JobType {
    pub fn capability(self) -> Capability {
        match self {
            JobType::Video => Capability::Video,
            JobType::Blog | JobType::Social => Capability::Text,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobType::Video => "video",
            JobType::Blog => "blog",
            JobType::Social => "social",
        }
    }
}

impl From<&str> for JobType {
    fn from(s: &str) -> Self {
        match s {
            "video" => JobType::Video,
            "social" => JobType::Social,
            _ => JobType::Blog,
        }
    }
}

/// Job lifecycle states. Strictly forward-moving under
/// PENDING < PROCESSING < terminal; a terminal state never mutates again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Canceled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Canceled
        )
    }

    /// Position in the lifecycle order. All terminal states share a rank:
    /// none of them is "later" than another, they are just absorbing.
    pub fn rank(self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Processing => 1,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Canceled => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Canceled => "CANCELED",
        }
    }
}

impl From<&str> for JobStatus {
    fn from(s: &str) -> Self {
        match s {
            "PROCESSING" => JobStatus::Processing,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" => JobStatus::Failed,
            "CANCELED" => JobStatus::Canceled,
            _ => JobStatus::Pending,
        }
    }
}

/// Row shape of `generation_jobs`. Type and status are stored as text; the
/// typed accessors below are what the rest of the crate uses.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GenerationJob {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_type: String,
    pub status: String,
    pub provider: String,
    pub params: serde_json::Value,
    pub provider_task_id: Option<String>,
    pub result_url: Option<String>,
    pub cost_estimate: Option<f64>,
    pub error_message: Option<String>,
    pub error_code: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl GenerationJob {
    pub fn status(&self) -> JobStatus {
        JobStatus::from(self.status.as_str())
    }

    pub fn job_type(&self) -> JobType {
        JobType::from(self.job_type.as_str())
    }
}
