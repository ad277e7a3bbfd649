use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::model::{GenerationJob, JobStatus, JobType};
use crate::providers::GenerationInput;

// --- SUBMISSION DTOs ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVideoJobRequest {
    #[validate(length(min = 1, max = 2000, message = "prompt must be 1-2000 characters"))]
    pub prompt: String,
    #[validate(range(min = 1, max = 60, message = "duration must be 1-60 seconds"))]
    pub duration_seconds: u32,
    #[validate(length(max = 100))]
    pub style: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBlogJobRequest {
    #[validate(length(min = 1, max = 300, message = "topic must be 1-300 characters"))]
    pub topic: String,
    #[validate(length(max = 50))]
    pub tone: Option<String>,
    #[validate(range(min = 100, max = 5000, message = "length must be 100-5000 words"))]
    pub length_words: u32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSocialJobRequest {
    #[validate(length(min = 1, message = "at least one platform is required"))]
    pub platforms: Vec<String>,
    #[validate(length(min = 1, max = 1000, message = "content seed must be 1-1000 characters"))]
    pub content_seed: String,
}

impl From<CreateVideoJobRequest> for GenerationInput {
    fn from(req: CreateVideoJobRequest) -> Self {
        GenerationInput::Video {
            prompt: req.prompt,
            duration_seconds: req.duration_seconds,
            style: req.style,
        }
    }
}

impl From<CreateBlogJobRequest> for GenerationInput {
    fn from(req: CreateBlogJobRequest) -> Self {
        GenerationInput::Blog {
            topic: req.topic,
            tone: req.tone,
            length_words: req.length_words,
        }
    }
}

impl From<CreateSocialJobRequest> for GenerationInput {
    fn from(req: CreateSocialJobRequest) -> Self {
        GenerationInput::Social {
            platforms: req.platforms,
            content_seed: req.content_seed,
        }
    }
}

// --- SNAPSHOT DTOs ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobResult {
    pub url: String,
    pub cost_usd: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobError {
    pub message: String,
    pub code: Option<String>,
}

/// Snapshot of a job as the dashboard sees it. `result` is present only when
/// COMPLETED, `error` only when FAILED.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobSnapshot {
    pub id: Uuid,
    pub job_type: JobType,
    pub status: JobStatus,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobError>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: OffsetDateTime,
}

impl From<&GenerationJob> for JobSnapshot {
    fn from(job: &GenerationJob) -> Self {
        let status = job.status();
        Self {
            id: job.id,
            job_type: job.job_type(),
            status,
            provider: job.provider.clone(),
            result: match status {
                JobStatus::Completed => job.result_url.clone().map(|url| JobResult {
                    url,
                    cost_usd: job.cost_estimate,
                }),
                _ => None,
            },
            error: match status {
                JobStatus::Failed => job.error_message.clone().map(|message| JobError {
                    message,
                    code: job.error_code.clone(),
                }),
                _ => None,
            },
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EstimateResponse {
    pub cost_usd: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn empty_prompt_is_rejected() {
        let req = CreateVideoJobRequest {
            prompt: String::new(),
            duration_seconds: 10,
            style: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn zero_duration_is_rejected() {
        let req = CreateVideoJobRequest {
            prompt: "city timelapse".to_string(),
            duration_seconds: 0,
            style: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn empty_platform_list_is_rejected() {
        let req = CreateSocialJobRequest {
            platforms: vec![],
            content_seed: "launch recap".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn well_formed_blog_request_passes() {
        let req = CreateBlogJobRequest {
            topic: "AI trends".to_string(),
            tone: Some("casual".to_string()),
            length_words: 800,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn snapshot_hides_result_until_completed() {
        let now = OffsetDateTime::now_utc();
        let mut job = GenerationJob {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            job_type: "video".to_string(),
            status: "PROCESSING".to_string(),
            provider: "hailuo".to_string(),
            params: serde_json::json!({}),
            provider_task_id: None,
            result_url: Some("https://cdn.example.com/v.mp4".to_string()),
            cost_estimate: Some(1.2),
            error_message: None,
            error_code: None,
            created_at: now,
            updated_at: now,
        };

        let snapshot = JobSnapshot::from(&job);
        assert!(snapshot.result.is_none());

        job.status = "COMPLETED".to_string();
        let snapshot = JobSnapshot::from(&job);
        assert_eq!(
            snapshot.result.unwrap().url,
            "https://cdn.example.com/v.mp4"
        );
    }
}
