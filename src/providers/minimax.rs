//! MiniMax audio adapter: background music and sound effects. Audio-only by
//! contract; every other capability is rejected before any network call.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{
    Capability, GenerationInput, GenerationOutput, GenerationProvider, ProviderError, Submission,
};

const API_BASE: &str = "https://api.minimax.chat/v1";
const MUSIC_MODEL: &str = "music-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// USD per second of generated audio.
const MUSIC_RATE_PER_SECOND: f64 = 0.01;

const CAPABILITIES: &[Capability] = &[Capability::Audio];

pub struct MiniMaxProvider {
    api_key: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for MiniMaxProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniMaxProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl MiniMaxProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base(api_key, API_BASE.to_string())
    }

    pub fn with_base(api_key: String, api_base: String) -> Self {
        Self {
            api_key: SecretString::from(api_key),
            api_base,
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl GenerationProvider for MiniMaxProvider {
    fn name(&self) -> &'static str {
        "minimax"
    }

    fn capabilities(&self) -> &'static [Capability] {
        CAPABILITIES
    }

    async fn submit(&self, input: &GenerationInput) -> Result<Submission, ProviderError> {
        let GenerationInput::Music {
            prompt,
            duration_seconds,
        } = input
        else {
            return Err(ProviderError::Unsupported {
                provider: self.name(),
                capability: input.capability(),
            });
        };

        let request = MusicRequest {
            model: MUSIC_MODEL.to_string(),
            prompt: prompt.clone(),
            duration: *duration_seconds,
        };

        debug!(provider = self.name(), duration = duration_seconds, "submitting music request");
        let response = self
            .client
            .post(format!("{}/music_generation", self.api_base))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: self.name(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: self.name(),
                status,
                body,
            });
        }

        let body: MusicResponse =
            response
                .json()
                .await
                .map_err(|source| ProviderError::Transport {
                    provider: self.name(),
                    source,
                })?;

        info!(provider = self.name(), "music generated");
        Ok(Submission::Completed(GenerationOutput {
            url: body.audio_url,
            cost_usd: self.estimate_cost(input)?,
        }))
    }

    fn estimate_cost(&self, input: &GenerationInput) -> Result<f64, ProviderError> {
        match input {
            GenerationInput::Music {
                duration_seconds, ..
            } => Ok(f64::from(*duration_seconds) * MUSIC_RATE_PER_SECOND),
            _ => Err(ProviderError::Unsupported {
                provider: self.name(),
                capability: input.capability(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct MusicRequest {
    model: String,
    prompt: String,
    duration: u32,
}

#[derive(Debug, Deserialize)]
struct MusicResponse {
    audio_url: String,
}
