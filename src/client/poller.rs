//! Client-side polling loop for generation jobs.
//!
//! Fetches a job snapshot immediately, surfaces every snapshot to the
//! observer (so a UI can render progress, not just the end state), then
//! refetches on a fixed interval until the job reaches a terminal status.
//! Fetches for one job are strictly sequential; a new one is never issued
//! while the previous is in flight, so observed statuses are monotonically
//! non-decreasing in lifecycle order.
//!
//! The retry policy for transient fetch failures is explicit: by default the
//! poller retries forever on the same schedule, but a consecutive-failure cap
//! can be configured. A spawned poll owns a cancellation token, so dropping a
//! view can stop its poll deterministically instead of leaking a timer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::modules::generation::dto::JobSnapshot;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Transport-level failure while fetching a snapshot. One of these does not
/// abandon the job; the poller keeps its schedule.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct SourceError(pub String);

/// Where snapshots come from. The HTTP client implements this against the
/// backend; tests script it.
#[async_trait]
pub trait JobStatusSource: Send + Sync {
    async fn fetch(&self, job_id: Uuid) -> Result<JobSnapshot, SourceError>;

    /// Request cancellation. Sent once; acknowledgment carries the CANCELED
    /// snapshot. Best-effort with respect to vendor-side work.
    async fn cancel(&self, job_id: Uuid) -> Result<JobSnapshot, SourceError>;
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    /// `None` retries forever, matching the reference dashboard behavior.
    pub max_consecutive_failures: Option<u32>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_consecutive_failures: None,
        }
    }
}

/// How a poll loop ended.
#[derive(Debug)]
pub enum PollEnd {
    /// The job reached COMPLETED, FAILED or CANCELED.
    Terminal(JobSnapshot),
    /// The handle was stopped (or the cancel acknowledgment arrived).
    Stopped,
    /// The configured consecutive-failure cap was hit.
    FailureLimit(SourceError),
}

pub struct JobPoller<S> {
    source: Arc<S>,
    config: PollerConfig,
}

impl<S> JobPoller<S>
where
    S: JobStatusSource + 'static,
{
    pub fn new(source: Arc<S>, config: PollerConfig) -> Self {
        Self { source, config }
    }

    /// Drive the loop to completion on the current task. The observer sees
    /// every successfully fetched snapshot, including the terminal one.
    pub async fn run(
        &self,
        job_id: Uuid,
        mut observer: impl FnMut(&JobSnapshot) + Send,
    ) -> PollEnd {
        self.run_with_token(job_id, &CancellationToken::new(), &mut observer)
            .await
    }

    async fn run_with_token(
        &self,
        job_id: Uuid,
        token: &CancellationToken,
        observer: &mut (impl FnMut(&JobSnapshot) + Send),
    ) -> PollEnd {
        let mut consecutive_failures: u32 = 0;

        loop {
            if token.is_cancelled() {
                return PollEnd::Stopped;
            }

            match self.source.fetch(job_id).await {
                Ok(snapshot) => {
                    consecutive_failures = 0;
                    debug!(job_id = %job_id, status = snapshot.status.as_str(), "poll tick");
                    observer(&snapshot);
                    if snapshot.status.is_terminal() {
                        return PollEnd::Terminal(snapshot);
                    }
                }
                Err(err) => {
                    consecutive_failures += 1;
                    warn!(job_id = %job_id, consecutive_failures, "poll fetch failed: {err}");
                    if let Some(cap) = self.config.max_consecutive_failures {
                        if consecutive_failures >= cap {
                            return PollEnd::FailureLimit(err);
                        }
                    }
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                _ = token.cancelled() => return PollEnd::Stopped,
            }
        }
    }

    /// Spawn the loop on the runtime and return a handle that can stop it.
    pub fn spawn(
        self,
        job_id: Uuid,
        mut observer: impl FnMut(&JobSnapshot) + Send + 'static,
    ) -> PollHandle<S> {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let source = Arc::clone(&self.source);
        let join = tokio::spawn(async move {
            self.run_with_token(job_id, &task_token, &mut observer).await
        });
        PollHandle {
            job_id,
            source,
            token,
            join,
        }
    }
}

/// Handle to a spawned poll loop.
pub struct PollHandle<S> {
    job_id: Uuid,
    source: Arc<S>,
    token: CancellationToken,
    join: tokio::task::JoinHandle<PollEnd>,
}

impl<S> PollHandle<S>
where
    S: JobStatusSource,
{
    /// Stop polling without touching the job. Deterministic: after this the
    /// loop issues no further fetches.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Send one cancel request for the job, then stop polling regardless of
    /// whether the vendor-side work actually halts.
    pub async fn cancel(&self) -> Result<JobSnapshot, SourceError> {
        let acknowledged = self.source.cancel(self.job_id).await;
        self.token.cancel();
        acknowledged
    }

    pub async fn join(self) -> PollEnd {
        self.join.await.unwrap_or(PollEnd::Stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use time::OffsetDateTime;

    use crate::modules::generation::dto::{JobResult, JobSnapshot};
    use crate::modules::generation::model::{JobStatus, JobType};

    fn snapshot(id: Uuid, status: JobStatus) -> JobSnapshot {
        let now = OffsetDateTime::now_utc();
        JobSnapshot {
            id,
            job_type: JobType::Blog,
            status,
            provider: "openai".to_string(),
            result: match status {
                JobStatus::Completed => Some(JobResult {
                    url: "https://cdn.example.com/post.md".to_string(),
                    cost_usd: Some(0.01),
                }),
                _ => None,
            },
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Scripted source: pops one response per fetch and counts calls.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<JobSnapshot, SourceError>>>,
        fetches: AtomicUsize,
        cancels: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<JobSnapshot, SourceError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                fetches: AtomicUsize::new(0),
                cancels: AtomicUsize::new(0),
            })
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl JobStatusSource for ScriptedSource {
        async fn fetch(&self, job_id: Uuid) -> Result<JobSnapshot, SourceError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(snapshot(job_id, JobStatus::Completed)))
        }

        async fn cancel(&self, job_id: Uuid) -> Result<JobSnapshot, SourceError> {
            self.cancels.fetch_add(1, Ordering::SeqCst);
            Ok(snapshot(job_id, JobStatus::Canceled))
        }
    }

    fn fast_config() -> PollerConfig {
        PollerConfig {
            interval: Duration::from_millis(2),
            max_consecutive_failures: None,
        }
    }

    #[tokio::test]
    async fn surfaces_every_snapshot_and_stops_at_terminal() {
        let job_id = Uuid::new_v4();
        let source = ScriptedSource::new(vec![
            Ok(snapshot(job_id, JobStatus::Pending)),
            Ok(snapshot(job_id, JobStatus::Processing)),
            Ok(snapshot(job_id, JobStatus::Completed)),
        ]);

        let poller = JobPoller::new(Arc::clone(&source), fast_config());
        let mut seen = Vec::new();
        let end = poller.run(job_id, |s| seen.push(s.status)).await;

        assert_eq!(
            seen,
            vec![JobStatus::Pending, JobStatus::Processing, JobStatus::Completed]
        );
        assert!(matches!(end, PollEnd::Terminal(s) if s.result.is_some()));
        // No fetch after the terminal snapshot.
        assert_eq!(source.fetch_count(), 3);
    }

    #[tokio::test]
    async fn observed_statuses_never_regress() {
        let job_id = Uuid::new_v4();
        let source = ScriptedSource::new(vec![
            Ok(snapshot(job_id, JobStatus::Pending)),
            Ok(snapshot(job_id, JobStatus::Pending)),
            Ok(snapshot(job_id, JobStatus::Processing)),
            Ok(snapshot(job_id, JobStatus::Failed)),
        ]);

        let poller = JobPoller::new(source, fast_config());
        let mut ranks = Vec::new();
        poller.run(job_id, |s| ranks.push(s.status.rank())).await;

        assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn transient_failures_keep_the_schedule() {
        let job_id = Uuid::new_v4();
        let source = ScriptedSource::new(vec![
            Ok(snapshot(job_id, JobStatus::Processing)),
            Err(SourceError("connection reset".to_string())),
            Err(SourceError("connection reset".to_string())),
            Ok(snapshot(job_id, JobStatus::Completed)),
        ]);

        let poller = JobPoller::new(Arc::clone(&source), fast_config());
        let mut seen = Vec::new();
        let end = poller.run(job_id, |s| seen.push(s.status)).await;

        assert!(matches!(end, PollEnd::Terminal(_)));
        assert_eq!(seen, vec![JobStatus::Processing, JobStatus::Completed]);
        assert_eq!(source.fetch_count(), 4);
    }

    #[tokio::test]
    async fn failure_cap_ends_the_loop() {
        let job_id = Uuid::new_v4();
        let source = ScriptedSource::new(vec![
            Err(SourceError("down".to_string())),
            Err(SourceError("down".to_string())),
            Err(SourceError("down".to_string())),
        ]);

        let poller = JobPoller::new(
            Arc::clone(&source),
            PollerConfig {
                interval: Duration::from_millis(2),
                max_consecutive_failures: Some(3),
            },
        );
        let end = poller.run(job_id, |_| {}).await;

        assert!(matches!(end, PollEnd::FailureLimit(_)));
        assert_eq!(source.fetch_count(), 3);
    }

    #[tokio::test]
    async fn success_resets_the_failure_counter() {
        let job_id = Uuid::new_v4();
        let source = ScriptedSource::new(vec![
            Err(SourceError("down".to_string())),
            Ok(snapshot(job_id, JobStatus::Processing)),
            Err(SourceError("down".to_string())),
            Ok(snapshot(job_id, JobStatus::Completed)),
        ]);

        let poller = JobPoller::new(
            Arc::clone(&source),
            PollerConfig {
                interval: Duration::from_millis(2),
                max_consecutive_failures: Some(2),
            },
        );
        let end = poller.run(job_id, |_| {}).await;

        // Two failures happen, but never two in a row.
        assert!(matches!(end, PollEnd::Terminal(_)));
    }

    #[tokio::test]
    async fn stop_is_deterministic() {
        let job_id = Uuid::new_v4();
        // Endless PROCESSING script (the fallback answer never triggers
        // because stop lands first).
        let source = ScriptedSource::new(vec![
            Ok(snapshot(job_id, JobStatus::Processing)),
            Ok(snapshot(job_id, JobStatus::Processing)),
            Ok(snapshot(job_id, JobStatus::Processing)),
        ]);

        let poller = JobPoller::new(
            Arc::clone(&source),
            PollerConfig {
                interval: Duration::from_secs(60),
                max_consecutive_failures: None,
            },
        );
        let handle = poller.spawn(job_id, |_| {});

        // Let the first fetch land, then stop mid-interval.
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.stop();
        let end = handle.join().await;

        assert!(matches!(end, PollEnd::Stopped));
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn cancel_sends_one_request_and_stops_polling() {
        let job_id = Uuid::new_v4();
        let source = ScriptedSource::new(vec![Ok(snapshot(job_id, JobStatus::Processing))]);

        let poller = JobPoller::new(
            Arc::clone(&source),
            PollerConfig {
                interval: Duration::from_secs(60),
                max_consecutive_failures: None,
            },
        );
        let handle = poller.spawn(job_id, |_| {});
        tokio::time::sleep(Duration::from_millis(20)).await;

        let acknowledged = handle.cancel().await.unwrap();
        assert_eq!(acknowledged.status, JobStatus::Canceled);
        assert_eq!(source.cancels.load(Ordering::SeqCst), 1);

        let end = handle.join().await;
        assert!(matches!(end, PollEnd::Stopped));
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn blog_scenario_end_to_end() {
        // Submit "AI trends" -> PENDING, then PROCESSING, then COMPLETED with
        // a result URL; the poller stops after the third fetch.
        let job_id = Uuid::new_v4();
        let source = ScriptedSource::new(vec![
            Ok(snapshot(job_id, JobStatus::Pending)),
            Ok(snapshot(job_id, JobStatus::Processing)),
            Ok(snapshot(job_id, JobStatus::Completed)),
        ]);

        let poller = JobPoller::new(Arc::clone(&source), fast_config());
        let mut last = None;
        let end = poller.run(job_id, |s| last = Some(s.clone())).await;

        let last = last.unwrap();
        assert_eq!(last.status, JobStatus::Completed);
        assert!(last.result.unwrap().url.starts_with("https://"));
        assert!(matches!(end, PollEnd::Terminal(_)));

        // Give any stray timer a chance to misbehave, then confirm silence.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(source.fetch_count(), 3);
    }
}
