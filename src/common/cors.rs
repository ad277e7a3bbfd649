use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::settings::AppConfig;

/// Production dashboard origin. Always allowed, and the value echoed back
/// when a request arrives from an origin we do not recognize.
pub const DEFAULT_ORIGIN: &str = "https://burstlet.vercel.app";

const LOCAL_ORIGIN: &str = "http://localhost:3000";

/// Static allow-list plus whatever FRONTEND_URL points at (preview deploys).
pub fn allowed_origins(config: &AppConfig) -> Vec<String> {
    let mut origins = vec![DEFAULT_ORIGIN.to_string(), LOCAL_ORIGIN.to_string()];
    if let Some(frontend) = &config.frontend_url {
        let frontend = frontend.trim_end_matches('/').to_string();
        if !origins.contains(&frontend) {
            origins.push(frontend);
        }
    }
    origins
}

/// Origin to echo in `Access-Control-Allow-Origin`: the request origin when it
/// is allow-listed, otherwise the default production origin.
pub fn resolve_origin(config: &AppConfig, request_origin: Option<&str>) -> String {
    let origins = allowed_origins(config);
    match request_origin {
        Some(origin) if origins.iter().any(|o| o == origin) => origin.to_string(),
        _ => DEFAULT_ORIGIN.to_string(),
    }
}

pub fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins(config)
        .into_iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_origin_is_echoed() {
        let config = AppConfig::blank();
        let origin = resolve_origin(&config, Some("https://burstlet.vercel.app"));
        assert_eq!(origin, "https://burstlet.vercel.app");
    }

    #[test]
    fn unknown_origin_falls_back_to_default() {
        let config = AppConfig::blank();
        let origin = resolve_origin(&config, Some("https://evil.example.com"));
        assert_eq!(origin, DEFAULT_ORIGIN);
    }

    #[test]
    fn frontend_url_joins_the_allow_list() {
        let mut config = AppConfig::blank();
        config.frontend_url = Some("https://preview.burstlet.dev/".to_string());

        let origins = allowed_origins(&config);
        assert!(origins.contains(&"https://preview.burstlet.dev".to_string()));

        let origin = resolve_origin(&config, Some("https://preview.burstlet.dev"));
        assert_eq!(origin, "https://preview.burstlet.dev");
    }

    #[test]
    fn missing_origin_header_gets_default() {
        let config = AppConfig::blank();
        assert_eq!(resolve_origin(&config, None), DEFAULT_ORIGIN);
    }
}
