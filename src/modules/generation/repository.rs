use sqlx::PgPool;
use uuid::Uuid;

use super::model::{GenerationJob, JobStatus};
use super::service::NewJob;

const JOB_COLUMNS: &str = "id, user_id, job_type, status, provider, params, provider_task_id, \
     result_url, cost_estimate, error_message, error_code, created_at, updated_at";

/// All writes go through here; the status column only ever moves forward
/// because every transition is a conditional UPDATE guarded on the prior
/// state. A lost race shows up as zero affected rows, never as a backward
/// transition.
pub struct GenerationRepository;

impl GenerationRepository {
    pub async fn create(
        pool: &PgPool,
        new_job: &NewJob,
    ) -> Result<GenerationJob, sqlx::Error> {
        sqlx::query_as::<_, GenerationJob>(&format!(
            "INSERT INTO generation_jobs (id, user_id, job_type, status, provider, params) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {JOB_COLUMNS}"
        ))
        .bind(new_job.id)
        .bind(new_job.user_id)
        .bind(new_job.job_type.as_str())
        .bind(new_job.status.as_str())
        .bind(new_job.provider)
        .bind(&new_job.params)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<GenerationJob>, sqlx::Error> {
        sqlx::query_as::<_, GenerationJob>(&format!(
            "SELECT {JOB_COLUMNS} FROM generation_jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_for_user(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<GenerationJob>, sqlx::Error> {
        sqlx::query_as::<_, GenerationJob>(&format!(
            "SELECT {JOB_COLUMNS} FROM generation_jobs WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<GenerationJob>, sqlx::Error> {
        sqlx::query_as::<_, GenerationJob>(&format!(
            "SELECT {JOB_COLUMNS} FROM generation_jobs \
             WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Rows a restarted process has to pick back up: the dispatch channel is
    /// not durable, so anything non-terminal at boot came from a previous
    /// process.
    pub async fn list_non_terminal(pool: &PgPool) -> Result<Vec<GenerationJob>, sqlx::Error> {
        sqlx::query_as::<_, GenerationJob>(&format!(
            "SELECT {JOB_COLUMNS} FROM generation_jobs \
             WHERE status IN ('PENDING', 'PROCESSING') ORDER BY created_at ASC"
        ))
        .fetch_all(pool)
        .await
    }

    /// PENDING -> PROCESSING. False when the job was canceled (or otherwise
    /// settled) before the dispatcher picked it up.
    pub async fn mark_processing(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE generation_jobs SET status = 'PROCESSING', updated_at = NOW() \
             WHERE id = $1 AND status = 'PENDING'",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_provider_task(
        pool: &PgPool,
        id: Uuid,
        task_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE generation_jobs SET provider_task_id = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(task_id)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// PROCESSING -> COMPLETED.
    pub async fn complete(
        pool: &PgPool,
        id: Uuid,
        result_url: &str,
        cost_usd: f64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE generation_jobs \
             SET status = 'COMPLETED', result_url = $1, cost_estimate = $2, updated_at = NOW() \
             WHERE id = $3 AND status = 'PROCESSING'",
        )
        .bind(result_url)
        .bind(cost_usd)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Non-terminal -> FAILED.
    pub async fn fail(
        pool: &PgPool,
        id: Uuid,
        message: &str,
        code: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE generation_jobs \
             SET status = 'FAILED', error_message = $1, error_code = $2, updated_at = NOW() \
             WHERE id = $3 AND status IN ('PENDING', 'PROCESSING')",
        )
        .bind(message)
        .bind(code)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Non-terminal -> CANCELED, scoped to the owning user. Returns the
    /// updated row, or None when the job was already terminal or not theirs.
    pub async fn cancel(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<GenerationJob>, sqlx::Error> {
        sqlx::query_as::<_, GenerationJob>(&format!(
            "UPDATE generation_jobs SET status = 'CANCELED', updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND status IN ('PENDING', 'PROCESSING') \
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Lightweight status probe used by the dispatcher between vendor polls.
    pub async fn current_status(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<JobStatus>, sqlx::Error> {
        let status: Option<(String,)> =
            sqlx::query_as("SELECT status FROM generation_jobs WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(status.map(|(s,)| JobStatus::from(s.as_str())))
    }
}
