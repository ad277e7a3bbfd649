//! OpenAI adapter: blog and social copy via chat completions, voiceover via
//! the speech endpoint. Both are synchronous vendor calls, so `submit` always
//! resolves to a completed or failed output in one round trip.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{
    Capability, GenerationInput, GenerationOutput, GenerationProvider, ProviderError, Submission,
};

const API_BASE: &str = "https://api.openai.com/v1";
const CHAT_MODEL: &str = "gpt-4o-mini";
const TTS_MODEL: &str = "tts-1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// USD per 1k characters of synthesized speech.
const VOICEOVER_RATE_PER_1K_CHARS: f64 = 0.015;
/// USD per 1k generated words of copy.
const TEXT_RATE_PER_1K_WORDS: f64 = 0.002;

const CAPABILITIES: &[Capability] = &[Capability::Text, Capability::Audio];

pub struct OpenAiProvider {
    api_key: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl OpenAiProvider {
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

    fn prompt_for(input: &GenerationInput) -> String {
        match input {
            GenerationInput::Blog {
                topic,
                tone,
                length_words,
            } => format!(
                "Write a blog post of roughly {} words about \"{}\" in a {} tone. \
                 Return the post body only.",
                length_words,
                topic,
                tone.as_deref().unwrap_or("neutral"),
            ),
            GenerationInput::Social {
                platforms,
                content_seed,
            } => format!(
                "Write one short social post for each of these platforms: {}. \
                 Base them on: \"{}\". Keep each within the platform's length norms.",
                platforms.join(", "),
                content_seed,
            ),
            _ => String::new(),
        }
    }

    async fn generate_text(&self, input: &GenerationInput) -> Result<Submission, ProviderError> {
        let request = ChatCompletionRequest {
            model: CHAT_MODEL.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Self::prompt_for(input),
            }],
            temperature: 0.7,
        };

        debug!(provider = self.name(), "submitting chat completion");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
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

        let body: ChatCompletionResponse =
            response
                .json()
                .await
                .map_err(|source| ProviderError::Transport {
                    provider: self.name(),
                    source,
                })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::Api {
                provider: self.name(),
                status: 200,
                body: "response carried no choices".to_string(),
            })?;

        info!(provider = self.name(), chars = content.len(), "text generated");
        Ok(Submission::Completed(GenerationOutput {
            // Text output is inlined as a data URL; the dashboard renders it
            // directly instead of fetching an asset.
            url: format!("data:text/markdown,{content}"),
            cost_usd: self.estimate_cost(input)?,
        }))
    }

    async fn generate_voiceover(
        &self,
        input: &GenerationInput,
    ) -> Result<Submission, ProviderError> {
        let GenerationInput::Voiceover { text, voice } = input else {
            return Err(ProviderError::Unsupported {
                provider: self.name(),
                capability: input.capability(),
            });
        };

        let request = SpeechRequest {
            model: TTS_MODEL.to_string(),
            input: text.clone(),
            voice: voice.clone().unwrap_or_else(|| "alloy".to_string()),
        };

        debug!(provider = self.name(), "submitting speech request");
        let response = self
            .client
            .post(format!("{}/audio/speech", self.api_base))
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

        // The speech endpoint streams raw audio. Persisting it to asset
        // storage is the caller's concern; the adapter reports size only.
        let audio = response
            .bytes()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: self.name(),
                source,
            })?;

        info!(provider = self.name(), bytes = audio.len(), "voiceover generated");
        Ok(Submission::Completed(GenerationOutput {
            url: format!("data:audio/mpeg;base64,[{} bytes]", audio.len()),
            cost_usd: self.estimate_cost(input)?,
        }))
    }
}

#[async_trait]
impl GenerationProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn capabilities(&self) -> &'static [Capability] {
        CAPABILITIES
    }

    async fn submit(&self, input: &GenerationInput) -> Result<Submission, ProviderError> {
        if !self.supports(input.capability()) {
            return Err(ProviderError::Unsupported {
                provider: self.name(),
                capability: input.capability(),
            });
        }

        match input {
            GenerationInput::Blog { .. } | GenerationInput::Social { .. } => {
                self.generate_text(input).await
            }
            GenerationInput::Voiceover { .. } => self.generate_voiceover(input).await,
            // Music is audio but belongs to the MiniMax adapter.
            GenerationInput::Music { .. } | GenerationInput::Video { .. } => {
                Err(ProviderError::Unsupported {
                    provider: self.name(),
                    capability: input.capability(),
                })
            }
        }
    }

    fn estimate_cost(&self, input: &GenerationInput) -> Result<f64, ProviderError> {
        match input {
            GenerationInput::Voiceover { text, .. } => {
                Ok(text.chars().count() as f64 / 1000.0 * VOICEOVER_RATE_PER_1K_CHARS)
            }
            GenerationInput::Blog { length_words, .. } => {
                Ok(f64::from(*length_words) / 1000.0 * TEXT_RATE_PER_1K_WORDS)
            }
            GenerationInput::Social { platforms, .. } => {
                // Roughly 60 words of copy per platform.
                Ok(platforms.len() as f64 * 60.0 / 1000.0 * TEXT_RATE_PER_1K_WORDS)
            }
            _ => Err(ProviderError::Unsupported {
                provider: self.name(),
                capability: input.capability(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct SpeechRequest {
    model: String,
    input: String,
    voice: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAiProvider {
        OpenAiProvider::new("sk-test".to_string())
    }

    #[tokio::test]
    async fn video_is_rejected_without_network() {
        let input = GenerationInput::Video {
            prompt: "a timelapse of a city".to_string(),
            duration_seconds: 10,
            style: None,
        };
        let err = provider().submit(&input).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Unsupported {
                provider: "openai",
                capability: Capability::Video,
            }
        ));
    }

    #[test]
    fn voiceover_cost_scales_with_text_length() {
        let short = GenerationInput::Voiceover {
            text: "a".repeat(500),
            voice: None,
        };
        let long = GenerationInput::Voiceover {
            text: "a".repeat(1000),
            voice: None,
        };
        let p = provider();
        let short_cost = p.estimate_cost(&short).unwrap();
        let long_cost = p.estimate_cost(&long).unwrap();
        assert!((long_cost - short_cost * 2.0).abs() < 1e-9);
    }

    #[test]
    fn cost_estimation_rejects_foreign_capability() {
        let input = GenerationInput::Video {
            prompt: "ocean".to_string(),
            duration_seconds: 5,
            style: None,
        };
        assert!(provider().estimate_cost(&input).is_err());
    }

    #[test]
    fn debug_never_prints_the_key() {
        let rendered = format!("{:?}", provider());
        assert!(!rendered.contains("sk-test"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
