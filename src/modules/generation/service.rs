use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::dto::JobSnapshot;
use super::model::{GenerationJob, JobStatus, JobType};
use super::repository::GenerationRepository;
use crate::common::error::{ServiceError, ServiceResult};
use crate::providers::{GenerationInput, ProviderRegistry};
use crate::state::AppState;
use crate::workers::dispatcher::JobDispatch;

const LIST_LIMIT: i64 = 50;

/// A submission after validation and provider routing, ready to insert. The
/// id is assigned here, not by the database, so the accepted response always
/// carries a usable id.
#[derive(Debug)]
pub struct NewJob {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_type: JobType,
    pub status: JobStatus,
    pub provider: &'static str,
    pub params: serde_json::Value,
}

pub struct GenerationService;

impl GenerationService {
    /// Everything submit pins down before touching the database: validation,
    /// provider routing by capability, params encoding. A missing credential
    /// fails here, with no row created.
    fn prepare<R>(
        providers: &ProviderRegistry,
        user_id: Uuid,
        job_type: JobType,
        request: R,
    ) -> ServiceResult<NewJob>
    where
        R: Validate + Into<GenerationInput>,
    {
        request.validate()?;
        let input: GenerationInput = request.into();

        let provider = providers.for_capability(job_type.capability())?;
        let params = serde_json::to_value(&input)
            .map_err(|e| ServiceError::Internal(format!("failed to encode job params: {e}")))?;

        Ok(NewJob {
            id: Uuid::new_v4(),
            user_id,
            job_type,
            status: JobStatus::Pending,
            provider: provider.name(),
            params,
        })
    }

    /// Validate, persist a PENDING row and hand it to the dispatcher.
    pub async fn submit<R>(
        state: AppState,
        user_id: Uuid,
        job_type: JobType,
        request: R,
    ) -> ServiceResult<JobSnapshot>
    where
        R: Validate + Into<GenerationInput>,
    {
        let new_job = Self::prepare(&state.providers, user_id, job_type, request)?;
        let provider = new_job.provider;
        let job = GenerationRepository::create(&state.db, &new_job).await?;

        if let Err(e) = state.dispatch_tx.send(JobDispatch { job_id: job.id }).await {
            // The row stays PENDING; mark it failed instead of stranding it.
            warn!(job_id = %job.id, "dispatcher channel closed: {e}");
            GenerationRepository::fail(&state.db, job.id, "dispatcher unavailable", None).await?;
            return Err(ServiceError::Internal(
                "generation worker is not running".to_string(),
            ));
        }

        info!(job_id = %job.id, job_type = job_type.as_str(), provider, "job submitted");
        Ok(JobSnapshot::from(&job))
    }

    /// Snapshot read with a short redis read-through. Polling clients hit
    /// this every couple of seconds per job.
    pub async fn get_job(state: AppState, user_id: Uuid, id: Uuid) -> ServiceResult<JobSnapshot> {
        if let Some(cached) = state.redis.get_job_snapshot(user_id, id).await {
            if let Ok(snapshot) = serde_json::from_str::<JobSnapshot>(&cached) {
                return Ok(snapshot);
            }
        }

        let job = GenerationRepository::find_for_user(&state.db, user_id, id)
            .await?
            .ok_or(ServiceError::NotFound("job"))?;

        let snapshot = JobSnapshot::from(&job);
        if let Ok(encoded) = serde_json::to_string(&snapshot) {
            state.redis.put_job_snapshot(user_id, id, &encoded).await;
        }
        Ok(snapshot)
    }

    pub async fn list_jobs(state: AppState, user_id: Uuid) -> ServiceResult<Vec<JobSnapshot>> {
        let jobs = GenerationRepository::list_for_user(&state.db, user_id, LIST_LIMIT).await?;
        Ok(jobs.iter().map(JobSnapshot::from).collect())
    }

    /// Client-initiated cancel. The local row settles immediately; vendor-side
    /// cancellation is best-effort and may not stop work already in flight.
    pub async fn cancel(state: AppState, user_id: Uuid, id: Uuid) -> ServiceResult<JobSnapshot> {
        let canceled = GenerationRepository::cancel(&state.db, user_id, id).await?;

        let job = match canceled {
            Some(job) => job,
            None => {
                // Distinguish "not yours / missing" from "already settled".
                let existing = GenerationRepository::find_for_user(&state.db, user_id, id)
                    .await?
                    .ok_or(ServiceError::NotFound("job"))?;
                return Err(ServiceError::Conflict(format!(
                    "job is already {}",
                    existing.status
                )));
            }
        };

        state.redis.invalidate_job_snapshot(user_id, id).await;
        Self::cancel_remote_best_effort(&state, &job).await;

        info!(job_id = %id, "job canceled");
        Ok(JobSnapshot::from(&job))
    }

    async fn cancel_remote_best_effort(state: &AppState, job: &GenerationJob) {
        let Some(task_id) = &job.provider_task_id else {
            return;
        };
        let Ok(provider) = state.providers.for_capability(job.job_type().capability()) else {
            return;
        };
        if let Err(e) = provider.cancel_remote(task_id).await {
            warn!(job_id = %job.id, "vendor-side cancel failed: {e}");
        }
    }

    /// Local arithmetic only; never touches job state or the network.
    pub fn estimate(state: &AppState, input: &GenerationInput) -> ServiceResult<f64> {
        Ok(state.providers.estimate(input)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::AppConfig;
    use crate::modules::generation::dto::CreateBlogJobRequest;

    fn registry_with_openai() -> ProviderRegistry {
        let mut config = AppConfig::blank();
        config.openai_api_key = Some("sk-test".to_string());
        ProviderRegistry::from_config(&config)
    }

    fn blog_request(topic: &str) -> CreateBlogJobRequest {
        CreateBlogJobRequest {
            topic: topic.to_string(),
            tone: Some("casual".to_string()),
            length_words: 800,
        }
    }

    #[test]
    fn well_formed_submit_prepares_a_pending_job_with_an_id() {
        let user_id = Uuid::new_v4();
        let new_job = GenerationService::prepare(
            &registry_with_openai(),
            user_id,
            JobType::Blog,
            blog_request("AI trends"),
        )
        .unwrap();

        assert!(!new_job.id.is_nil());
        assert_eq!(new_job.status, JobStatus::Pending);
        assert_eq!(new_job.user_id, user_id);
        assert_eq!(new_job.job_type, JobType::Blog);
        assert_eq!(new_job.provider, "openai");
        assert_eq!(new_job.params["kind"], "blog");
        assert_eq!(new_job.params["topic"], "AI trends");
    }

    #[test]
    fn every_prepared_job_gets_its_own_id() {
        let registry = registry_with_openai();
        let a = GenerationService::prepare(
            &registry,
            Uuid::new_v4(),
            JobType::Blog,
            blog_request("first"),
        )
        .unwrap();
        let b = GenerationService::prepare(
            &registry,
            Uuid::new_v4(),
            JobType::Blog,
            blog_request("second"),
        )
        .unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn malformed_request_is_rejected_before_routing() {
        let err = GenerationService::prepare(
            &registry_with_openai(),
            Uuid::new_v4(),
            JobType::Blog,
            blog_request(""),
        )
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn missing_credential_rejects_the_submission() {
        let registry = ProviderRegistry::from_config(&AppConfig::blank());
        let err = GenerationService::prepare(
            &registry,
            Uuid::new_v4(),
            JobType::Blog,
            blog_request("AI trends"),
        )
        .unwrap_err();
        assert_eq!(
            err.status_code(),
            axum::http::StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
