//! Background executor for generation jobs. Consumes dispatches from the
//! in-process queue, performs the single vendor submit, and for asynchronous
//! vendors keeps polling the remote task until it settles. All status writes
//! are conditional updates, so a job canceled by the user mid-flight stays
//! CANCELED no matter what the vendor reports afterwards.

use std::time::Duration;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::modules::generation::model::{GenerationJob, JobStatus};
use crate::modules::generation::repository::GenerationRepository;
use crate::providers::{GenerationInput, ProviderError, RemoteStatus, Submission};
use crate::state::AppState;

/// Interval between remote-status polls for asynchronous vendors.
const REMOTE_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Give up on a remote task after this many polls (~10 minutes).
const REMOTE_POLL_LIMIT: u32 = 300;

#[derive(Debug, Clone)]
pub struct JobDispatch {
    pub job_id: Uuid,
}

/// What to do with a non-terminal row found at boot.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RecoveryAction {
    /// Enqueued but never picked up, or mid remote poll with a vendor task id
    /// to resume from.
    Requeue,
    /// Died mid vendor submit; the outcome is unknowable, so the job settles
    /// as failed rather than double-submitting.
    FailInterrupted,
    Skip,
}

fn recovery_action(job: &GenerationJob) -> RecoveryAction {
    match job.status() {
        JobStatus::Pending => RecoveryAction::Requeue,
        JobStatus::Processing if job.provider_task_id.is_some() => RecoveryAction::Requeue,
        JobStatus::Processing => RecoveryAction::FailInterrupted,
        _ => RecoveryAction::Skip,
    }
}

/// Sweep rows stranded by a previous process before the dispatcher starts
/// consuming. The channel is in-process only; the table is what survives a
/// restart.
pub async fn recover_stranded_jobs(state: &AppState) -> anyhow::Result<usize> {
    let stranded = GenerationRepository::list_non_terminal(&state.db).await?;
    let mut requeued = 0;

    for job in &stranded {
        match recovery_action(job) {
            RecoveryAction::Requeue => {
                state
                    .dispatch_tx
                    .send(JobDispatch { job_id: job.id })
                    .await?;
                requeued += 1;
            }
            RecoveryAction::FailInterrupted => {
                GenerationRepository::fail(&state.db, job.id, "interrupted by restart", None)
                    .await?;
                state.redis.invalidate_job_snapshot(job.user_id, job.id).await;
                warn!(job_id = %job.id, "job was mid-submit at shutdown, marked failed");
            }
            RecoveryAction::Skip => {}
        }
    }

    if !stranded.is_empty() {
        info!(
            stranded = stranded.len(),
            requeued, "recovered jobs from previous process"
        );
    }
    Ok(requeued)
}

pub async fn start_dispatcher(
    state: AppState,
    rx: async_channel::Receiver<JobDispatch>,
    shutdown: CancellationToken,
) {
    info!("generation dispatcher started");

    let mut stream = std::pin::pin!(rx);
    loop {
        let dispatch = tokio::select! {
            next = stream.next() => match next {
                Some(dispatch) => dispatch,
                None => break,
            },
            _ = shutdown.cancelled() => break,
        };

        if let Err(e) = process_job(&state, dispatch.job_id, &shutdown).await {
            error!(job_id = %dispatch.job_id, "job processing failed: {e}");
        }
    }

    info!("generation dispatcher stopped");
}

async fn process_job(
    state: &AppState,
    job_id: Uuid,
    shutdown: &CancellationToken,
) -> anyhow::Result<()> {
    let Some(job) = GenerationRepository::find_by_id(&state.db, job_id).await? else {
        warn!(job_id = %job_id, "dispatched job no longer exists");
        return Ok(());
    };

    // A PROCESSING row can only arrive here through the recovery sweep; the
    // vendor task already exists, so resume polling it instead of submitting
    // again.
    if job.status() == JobStatus::Processing {
        return match &job.provider_task_id {
            Some(task_id) => poll_remote_task(state, &job, task_id, shutdown).await,
            None => {
                GenerationRepository::fail(&state.db, job.id, "interrupted by restart", None)
                    .await?;
                state.redis.invalidate_job_snapshot(job.user_id, job.id).await;
                Ok(())
            }
        };
    }

    // Canceled (or otherwise settled) between enqueue and pickup.
    if !GenerationRepository::mark_processing(&state.db, job_id).await? {
        info!(job_id = %job_id, status = %job.status, "skipping settled job");
        return Ok(());
    }
    state.redis.invalidate_job_snapshot(job.user_id, job_id).await;

    let input: GenerationInput = serde_json::from_value(job.params.clone())?;
    let provider = match state.providers.for_capability(input.capability()) {
        Ok(provider) => provider,
        Err(e) => {
            settle_failed(state, &job, &e).await?;
            return Ok(());
        }
    };

    match provider.submit(&input).await {
        Ok(Submission::Completed(output)) => {
            GenerationRepository::complete(&state.db, job_id, &output.url, output.cost_usd)
                .await?;
            state.redis.invalidate_job_snapshot(job.user_id, job_id).await;
            info!(job_id = %job_id, provider = provider.name(), "job completed");
        }
        Ok(Submission::Accepted { task_id }) => {
            GenerationRepository::set_provider_task(&state.db, job_id, &task_id).await?;
            poll_remote_task(state, &job, &task_id, shutdown).await?;
        }
        Err(e) => settle_failed(state, &job, &e).await?,
    }

    Ok(())
}

/// Sequential polls against the vendor, one in flight at a time. Between
/// polls the local row is probed so a user cancel ends the loop promptly.
async fn poll_remote_task(
    state: &AppState,
    job: &GenerationJob,
    task_id: &str,
    shutdown: &CancellationToken,
) -> anyhow::Result<()> {
    let provider = state
        .providers
        .for_capability(job.job_type().capability())
        .map_err(anyhow::Error::from)?;

    for _ in 0..REMOTE_POLL_LIMIT {
        tokio::select! {
            _ = tokio::time::sleep(REMOTE_POLL_INTERVAL) => {}
            _ = shutdown.cancelled() => return Ok(()),
        }

        match GenerationRepository::current_status(&state.db, job.id).await? {
            Some(status) if status.is_terminal() => {
                info!(job_id = %job.id, status = status.as_str(), "remote polling stopped, job settled locally");
                if status == JobStatus::Canceled {
                    if let Err(e) = provider.cancel_remote(task_id).await {
                        warn!(job_id = %job.id, "vendor-side cancel failed: {e}");
                    }
                }
                return Ok(());
            }
            Some(_) => {}
            None => return Ok(()),
        }

        match provider.poll_remote(task_id).await {
            Ok(RemoteStatus::Processing) => continue,
            Ok(RemoteStatus::Completed(output)) => {
                GenerationRepository::complete(&state.db, job.id, &output.url, output.cost_usd)
                    .await?;
                state.redis.invalidate_job_snapshot(job.user_id, job.id).await;
                info!(job_id = %job.id, "remote task completed");
                return Ok(());
            }
            Ok(RemoteStatus::Failed { code, message }) => {
                GenerationRepository::fail(&state.db, job.id, &message, code.as_deref()).await?;
                state.redis.invalidate_job_snapshot(job.user_id, job.id).await;
                warn!(job_id = %job.id, "remote task failed: {message}");
                return Ok(());
            }
            // Transient transport trouble: keep the schedule, try again.
            Err(ProviderError::Transport { source, .. }) => {
                warn!(job_id = %job.id, "remote poll failed, will retry: {source}");
            }
            Err(e) => {
                settle_failed(state, job, &e).await?;
                return Ok(());
            }
        }
    }

    GenerationRepository::fail(&state.db, job.id, "vendor task timed out", None).await?;
    state.redis.invalidate_job_snapshot(job.user_id, job.id).await;
    Ok(())
}

async fn settle_failed(
    state: &AppState,
    job: &GenerationJob,
    err: &ProviderError,
) -> Result<(), sqlx::Error> {
    let code = match err {
        ProviderError::Api { status, .. } => Some(status.to_string()),
        _ => None,
    };
    GenerationRepository::fail(&state.db, job.id, &err.to_string(), code.as_deref()).await?;
    state.redis.invalidate_job_snapshot(job.user_id, job.id).await;
    warn!(job_id = %job.id, "job failed: {err}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn job(status: &str, provider_task_id: Option<&str>) -> GenerationJob {
        let now = OffsetDateTime::now_utc();
        GenerationJob {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            job_type: "video".to_string(),
            status: status.to_string(),
            provider: "hailuo".to_string(),
            params: serde_json::json!({"kind": "video", "prompt": "x", "duration_seconds": 5, "style": null}),
            provider_task_id: provider_task_id.map(str::to_string),
            result_url: None,
            cost_estimate: None,
            error_message: None,
            error_code: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn pending_rows_are_requeued_after_restart() {
        assert_eq!(recovery_action(&job("PENDING", None)), RecoveryAction::Requeue);
    }

    #[test]
    fn processing_with_a_vendor_task_resumes_polling() {
        assert_eq!(
            recovery_action(&job("PROCESSING", Some("task-42"))),
            RecoveryAction::Requeue
        );
    }

    #[test]
    fn processing_without_a_vendor_task_fails_as_interrupted() {
        // Mid vendor submit when the process died; re-submitting could charge
        // the user twice.
        assert_eq!(
            recovery_action(&job("PROCESSING", None)),
            RecoveryAction::FailInterrupted
        );
    }

    #[test]
    fn terminal_rows_are_left_alone() {
        for status in ["COMPLETED", "FAILED", "CANCELED"] {
            assert_eq!(recovery_action(&job(status, None)), RecoveryAction::Skip);
        }
    }
}
