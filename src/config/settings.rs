use serde::Deserialize;

use crate::config::env::{self, EnvKey};

/// Every credential is optional at load time. Presence of each one drives the
/// health-report service flags and whether the process can boot in full mode
/// at all (database + redis) versus the degraded fallback server.
#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub environment: String,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_jwt_secret: Option<String>,
    pub openai_api_key: Option<String>,
    pub hailuo_api_key: Option<String>,
    pub minimax_api_key: Option<String>,
    pub stripe_secret_key: Option<String>,
    pub frontend_url: Option<String>,
}

impl AppConfig {
    pub fn load() -> Self {
        Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 3001),
            environment: env::get_or(EnvKey::Environment, "development"),
            database_url: env::maybe(EnvKey::DatabaseUrl),
            redis_url: env::maybe(EnvKey::RedisUrl),
            supabase_url: env::maybe(EnvKey::SupabaseUrl),
            supabase_jwt_secret: env::maybe(EnvKey::SupabaseJwtSecret),
            openai_api_key: env::maybe(EnvKey::OpenAiApiKey),
            hailuo_api_key: env::maybe(EnvKey::HailuoApiKey),
            minimax_api_key: env::maybe(EnvKey::MiniMaxApiKey),
            stripe_secret_key: env::maybe(EnvKey::StripeSecretKey),
            frontend_url: env::maybe(EnvKey::FrontendUrl),
        }
    }

    /// Full mode needs a database and a cache; everything else degrades
    /// per-feature instead of blocking boot.
    pub fn supports_full_mode(&self) -> bool {
        self.database_url.is_some() && self.redis_url.is_some()
    }
}

#[cfg(test)]
impl AppConfig {
    pub(crate) fn blank() -> Self {
        Self {
            server_port: 3001,
            environment: "test".to_string(),
            database_url: None,
            redis_url: None,
            supabase_url: None,
            supabase_jwt_secret: None,
            openai_api_key: None,
            hailuo_api_key: None,
            minimax_api_key: None,
            stripe_secret_key: None,
            frontend_url: None,
        }
    }
}
