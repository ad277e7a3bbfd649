use serde::Serialize;
use utoipa::ToSchema;

use crate::config::settings::AppConfig;

/// One flag per credential-backed dependency: true iff the credential is
/// configured. Reported, not probed; a flag says "wired up", not "reachable".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ServiceFlags {
    pub database: bool,
    pub redis: bool,
    pub supabase: bool,
    pub openai: bool,
    pub hailuoai: bool,
    pub minimax: bool,
    pub stripe: bool,
}

impl ServiceFlags {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            database: config.database_url.is_some(),
            redis: config.redis_url.is_some(),
            supabase: config.supabase_url.is_some(),
            openai: config.openai_api_key.is_some(),
            hailuoai: config.hailuo_api_key.is_some(),
            minimax: config.minimax_api_key.is_some(),
            stripe: config.stripe_secret_key.is_some(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub mode: String,
    pub timestamp: String,
    pub uptime_secs: u64,
    pub environment: String,
    pub services: ServiceFlags,
}

impl HealthResponse {
    pub fn new(config: &AppConfig, mode: &str, uptime_secs: u64) -> Self {
        let timestamp = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        Self {
            status: "ok".to_string(),
            mode: mode.to_string(),
            timestamp,
            uptime_secs,
            environment: config.environment.clone(),
            services: ServiceFlags::from_config(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_flag_tracks_its_credential() {
        let mut config = AppConfig::blank();
        assert_eq!(
            ServiceFlags::from_config(&config),
            ServiceFlags {
                database: false,
                redis: false,
                supabase: false,
                openai: false,
                hailuoai: false,
                minimax: false,
                stripe: false,
            }
        );

        config.database_url = Some("postgres://localhost/burstlet".to_string());
        config.openai_api_key = Some("sk-test".to_string());
        let flags = ServiceFlags::from_config(&config);
        assert!(flags.database);
        assert!(flags.openai);
        assert!(!flags.redis);
        assert!(!flags.stripe);
    }

    #[test]
    fn health_response_reports_mode_and_environment() {
        let config = AppConfig::blank();
        let health = HealthResponse::new(&config, "fallback", 42);
        assert_eq!(health.status, "ok");
        assert_eq!(health.mode, "fallback");
        assert_eq!(health.uptime_secs, 42);
        assert_eq!(health.environment, "test");
        assert!(!health.timestamp.is_empty());
    }
}
