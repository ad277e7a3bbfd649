use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use tracing::{info, warn};
use uuid::Uuid;

/// Snapshot TTL. Polling clients fetch every couple of seconds, so a short
/// window absorbs the read load without serving stale terminal states for
/// long.
const JOB_SNAPSHOT_TTL_SECS: u64 = 2;

#[derive(Clone)]
pub struct RedisService {
    client: Client,
}

impl RedisService {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = Client::open(connection_string)?;

        // Fail at boot rather than on the first request.
        let _conn = client.get_multiplexed_async_connection().await?;

        info!("connected to redis");
        Ok(Self { client })
    }

    pub async fn get_conn(&self) -> Result<MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    // Scoped by owner so one user's poll can never serve another's snapshot.
    fn job_key(user_id: Uuid, job_id: Uuid) -> String {
        format!("job_snapshot:{user_id}:{job_id}")
    }

    /// Cached JSON snapshot of a job, if one is fresh. Cache errors degrade
    /// to a miss; the database stays authoritative.
    pub async fn get_job_snapshot(&self, user_id: Uuid, job_id: Uuid) -> Option<String> {
        let mut conn = match self.get_conn().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("redis unavailable for snapshot read: {e}");
                return None;
            }
        };
        conn.get::<_, Option<String>>(Self::job_key(user_id, job_id))
            .await
            .unwrap_or_default()
    }

    pub async fn put_job_snapshot(&self, user_id: Uuid, job_id: Uuid, snapshot_json: &str) {
        if let Ok(mut conn) = self.get_conn().await {
            let result: Result<(), redis::RedisError> = conn
                .set_ex(Self::job_key(user_id, job_id), snapshot_json, JOB_SNAPSHOT_TTL_SECS)
                .await;
            if let Err(e) = result {
                warn!("failed to cache job snapshot: {e}");
            }
        }
    }

    /// Drop the cached snapshot after a write so the next poll observes the
    /// new status immediately instead of after TTL expiry.
    pub async fn invalidate_job_snapshot(&self, user_id: Uuid, job_id: Uuid) {
        if let Ok(mut conn) = self.get_conn().await {
            let result: Result<(), redis::RedisError> = conn.del(Self::job_key(user_id, job_id)).await;
            if let Err(e) = result {
                warn!("failed to invalidate job snapshot: {e}");
            }
        }
    }
}
