//! AI vendor adapters.
//!
//! Each adapter translates an internal generation request into one vendor HTTP
//! call and normalizes the response. Adapters declare a fixed capability set at
//! construction; invoking anything outside that set fails with `Unsupported`
//! before any network I/O. No retries, no backoff: a vendor call either
//! succeeds or fails, and the caller decides what to do next.

mod hailuo;
mod minimax;
mod openai;

pub use hailuo::HailuoProvider;
pub use minimax::MiniMaxProvider;
pub use openai::OpenAiProvider;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::settings::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Video,
    Text,
    Audio,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Capability::Video => "video",
            Capability::Text => "text",
            Capability::Audio => "audio",
        };
        f.write_str(s)
    }
}

/// Single normalized error shape for everything that can go wrong inside an
/// adapter. Vendor-specific payloads ride along as diagnostics and never leak
/// their own exception shape to the caller.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider {provider} is not configured: {message}")]
    Config {
        provider: &'static str,
        message: String,
    },

    #[error("provider {provider} does not support {capability} generation")]
    Unsupported {
        provider: &'static str,
        capability: Capability,
    },

    #[error("provider {provider} returned {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("request to provider {provider} failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// Vendor-neutral request shape handed to an adapter.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationInput {
    Video {
        prompt: String,
        duration_seconds: u32,
        style: Option<String>,
    },
    Blog {
        topic: String,
        tone: Option<String>,
        length_words: u32,
    },
    Social {
        platforms: Vec<String>,
        content_seed: String,
    },
    Voiceover {
        text: String,
        voice: Option<String>,
    },
    Music {
        prompt: String,
        duration_seconds: u32,
    },
}

impl GenerationInput {
    pub fn capability(&self) -> Capability {
        match self {
            GenerationInput::Video { .. } => Capability::Video,
            GenerationInput::Blog { .. } | GenerationInput::Social { .. } => Capability::Text,
            GenerationInput::Voiceover { .. } | GenerationInput::Music { .. } => Capability::Audio,
        }
    }
}

/// Completed vendor output, normalized.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GenerationOutput {
    pub url: String,
    pub cost_usd: f64,
}

/// Outcome of a submit call. Text vendors answer synchronously; video vendors
/// hand back a task id that must be polled.
#[derive(Debug, Clone)]
pub enum Submission {
    Completed(GenerationOutput),
    Accepted { task_id: String },
}

/// Snapshot of a vendor-side asynchronous task.
#[derive(Debug, Clone)]
pub enum RemoteStatus {
    Processing,
    Completed(GenerationOutput),
    Failed {
        code: Option<String>,
        message: String,
    },
}

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> &'static [Capability];

    fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Issue the single vendor call for this request. Must check capability
    /// membership before touching the network.
    async fn submit(&self, input: &GenerationInput) -> Result<Submission, ProviderError>;

    /// Poll a vendor-side task. Only meaningful for adapters that return
    /// `Submission::Accepted`; everyone else rejects the call.
    async fn poll_remote(&self, task_id: &str) -> Result<RemoteStatus, ProviderError> {
        let _ = task_id;
        Err(ProviderError::Unsupported {
            provider: self.name(),
            capability: Capability::Video,
        })
    }

    /// Best-effort vendor-side cancellation. Default is a no-op because most
    /// vendors do not expose one; the job is still marked canceled locally.
    async fn cancel_remote(&self, task_id: &str) -> Result<(), ProviderError> {
        let _ = task_id;
        Ok(())
    }

    /// Approximate price from request size. Local arithmetic only.
    fn estimate_cost(&self, input: &GenerationInput) -> Result<f64, ProviderError>;
}

impl fmt::Debug for dyn GenerationProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationProvider")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

pub type SharedProvider = Arc<dyn GenerationProvider>;

/// Holds the adapters whose credentials are present and routes by capability.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<SharedProvider>,
}

impl ProviderRegistry {
    pub fn from_config(config: &AppConfig) -> Self {
        let mut providers: Vec<SharedProvider> = Vec::new();
        if let Some(key) = &config.openai_api_key {
            providers.push(Arc::new(OpenAiProvider::new(key.clone())));
        }
        if let Some(key) = &config.hailuo_api_key {
            providers.push(Arc::new(HailuoProvider::new(key.clone())));
        }
        if let Some(key) = &config.minimax_api_key {
            providers.push(Arc::new(MiniMaxProvider::new(key.clone())));
        }
        Self { providers }
    }

    fn missing(capability: Capability) -> ProviderError {
        let (provider, key) = match capability {
            Capability::Video => ("hailuo", "HAILUOAI_API_KEY"),
            Capability::Text => ("openai", "OPENAI_API_KEY"),
            Capability::Audio => ("minimax", "MINIMAX_API_KEY"),
        };
        ProviderError::Config {
            provider,
            message: format!("{key} is not set"),
        }
    }

    pub fn for_capability(&self, capability: Capability) -> Result<SharedProvider, ProviderError> {
        self.providers
            .iter()
            .find(|p| p.supports(capability))
            .cloned()
            .ok_or_else(|| Self::missing(capability))
    }

    /// Price a request against the first configured adapter that can actually
    /// estimate it. Capability membership alone is not enough: audio splits
    /// between voiceover (openai) and music (minimax).
    pub fn estimate(&self, input: &GenerationInput) -> Result<f64, ProviderError> {
        let capability = input.capability();
        let mut last_err = None;
        for provider in self.providers.iter().filter(|p| p.supports(capability)) {
            match provider.estimate_cost(input) {
                Ok(cost) => return Ok(cost),
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or_else(|| Self::missing(capability)))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_empty_without_credentials() {
        let config = AppConfig::blank();
        let registry = ProviderRegistry::from_config(&config);
        assert!(registry.names().is_empty());

        let err = registry.for_capability(Capability::Video).unwrap_err();
        assert!(matches!(err, ProviderError::Config { provider: "hailuo", .. }));
    }

    #[test]
    fn registry_routes_by_capability() {
        let mut config = AppConfig::blank();
        config.openai_api_key = Some("sk-test".to_string());
        config.hailuo_api_key = Some("hl-test".to_string());

        let registry = ProviderRegistry::from_config(&config);
        assert_eq!(
            registry.for_capability(Capability::Text).unwrap().name(),
            "openai"
        );
        assert_eq!(
            registry.for_capability(Capability::Video).unwrap().name(),
            "hailuo"
        );
        // OpenAI covers voiceover audio as well, so audio routes there
        // before falling back to the MiniMax music adapter.
        assert_eq!(
            registry.for_capability(Capability::Audio).unwrap().name(),
            "openai"
        );
    }

    #[test]
    fn estimate_skips_adapters_that_cannot_price_the_request() {
        let mut config = AppConfig::blank();
        config.openai_api_key = Some("sk-test".to_string());
        config.minimax_api_key = Some("mm-test".to_string());
        let registry = ProviderRegistry::from_config(&config);

        // Audio routes to openai first, which cannot price music; the
        // estimate falls through to minimax.
        let music = GenerationInput::Music {
            prompt: "ambient pad".to_string(),
            duration_seconds: 30,
        };
        assert!(registry.estimate(&music).unwrap() > 0.0);
    }

    #[test]
    fn input_maps_to_capability() {
        let input = GenerationInput::Social {
            platforms: vec!["tiktok".to_string()],
            content_seed: "launch week recap".to_string(),
        };
        assert_eq!(input.capability(), Capability::Text);
    }
}
