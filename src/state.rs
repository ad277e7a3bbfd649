use std::time::Instant;

use crate::config::settings::AppConfig;
use crate::infrastructure::db::pool::DbPool;
use crate::infrastructure::redis::client::RedisService;
use crate::infrastructure::stripe::client::StripeClient;
use crate::providers::ProviderRegistry;
use crate::workers::dispatcher::JobDispatch;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub redis: RedisService,
    pub providers: ProviderRegistry,
    /// None when STRIPE_SECRET_KEY is absent; billing endpoints then report
    /// the service as unconfigured instead of failing at boot.
    pub stripe: Option<StripeClient>,
    pub dispatch_tx: async_channel::Sender<JobDispatch>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DbPool,
        redis: RedisService,
        dispatch_tx: async_channel::Sender<JobDispatch>,
    ) -> Self {
        let providers = ProviderRegistry::from_config(&config);
        let stripe = config
            .stripe_secret_key
            .clone()
            .map(StripeClient::new);
        Self {
            config,
            db,
            redis,
            providers,
            stripe,
            dispatch_tx,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
