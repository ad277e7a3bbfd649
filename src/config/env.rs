use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    Environment,
    DatabaseUrl,
    RedisUrl,
    SupabaseUrl,
    SupabaseJwtSecret,
    OpenAiApiKey,
    HailuoApiKey,
    MiniMaxApiKey,
    StripeSecretKey,
    FrontendUrl,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "PORT",
            EnvKey::Environment => "APP_ENV",
            EnvKey::DatabaseUrl => "DATABASE_URL",
            EnvKey::RedisUrl => "REDIS_URL",
            EnvKey::SupabaseUrl => "SUPABASE_URL",
            EnvKey::SupabaseJwtSecret => "SUPABASE_JWT_SECRET",
            EnvKey::OpenAiApiKey => "OPENAI_API_KEY",
            EnvKey::HailuoApiKey => "HAILUOAI_API_KEY",
            EnvKey::MiniMaxApiKey => "MINIMAX_API_KEY",
            EnvKey::StripeSecretKey => "STRIPE_SECRET_KEY",
            EnvKey::FrontendUrl => "FRONTEND_URL",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

/// Empty values count as absent so a blank line in .env does not
/// flip a service flag to "configured".
pub fn maybe(key: EnvKey) -> Option<String> {
    env::var(key.as_str()).ok().filter(|v| !v.is_empty())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
