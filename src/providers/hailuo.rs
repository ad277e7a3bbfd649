//! HailuoAI video adapter. Video generation is asynchronous on the vendor
//! side: `submit` creates a task and hands back its id, and the dispatcher
//! polls `poll_remote` until the task settles.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{
    Capability, GenerationInput, GenerationOutput, GenerationProvider, ProviderError, RemoteStatus,
    Submission,
};

const API_BASE: &str = "https://api.hailuoai.com/v1";
const VIDEO_MODEL: &str = "video-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// USD per second of rendered video.
const VIDEO_RATE_PER_SECOND: f64 = 0.08;

const CAPABILITIES: &[Capability] = &[Capability::Video];

pub struct HailuoProvider {
    api_key: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for HailuoProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HailuoProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl HailuoProvider {
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

    async fn read_error(&self, response: reqwest::Response) -> ProviderError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ProviderError::Api {
            provider: self.name(),
            status,
            body,
        }
    }
}

#[async_trait]
impl GenerationProvider for HailuoProvider {
    fn name(&self) -> &'static str {
        "hailuo"
    }

    fn capabilities(&self) -> &'static [Capability] {
        CAPABILITIES
    }

    async fn submit(&self, input: &GenerationInput) -> Result<Submission, ProviderError> {
        let GenerationInput::Video {
            prompt,
            duration_seconds,
            style,
        } = input
        else {
            return Err(ProviderError::Unsupported {
                provider: self.name(),
                capability: input.capability(),
            });
        };

        let request = CreateTaskRequest {
            model: VIDEO_MODEL.to_string(),
            prompt: match style {
                Some(style) => format!("{prompt}, {style} style"),
                None => prompt.clone(),
            },
            duration: *duration_seconds,
        };

        debug!(provider = self.name(), duration = duration_seconds, "creating video task");
        let response = self
            .client
            .post(format!("{}/video_generation", self.api_base))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: self.name(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(self.read_error(response).await);
        }

        let body: CreateTaskResponse =
            response
                .json()
                .await
                .map_err(|source| ProviderError::Transport {
                    provider: self.name(),
                    source,
                })?;

        info!(provider = self.name(), task_id = %body.task_id, "video task accepted");
        Ok(Submission::Accepted {
            task_id: body.task_id,
        })
    }

    async fn poll_remote(&self, task_id: &str) -> Result<RemoteStatus, ProviderError> {
        let response = self
            .client
            .get(format!("{}/video_generation/{task_id}", self.api_base))
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: self.name(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(self.read_error(response).await);
        }

        let body: TaskStatusResponse =
            response
                .json()
                .await
                .map_err(|source| ProviderError::Transport {
                    provider: self.name(),
                    source,
                })?;

        match body.status.as_str() {
            "queued" | "processing" => Ok(RemoteStatus::Processing),
            "success" => {
                let url = body.video_url.ok_or_else(|| ProviderError::Api {
                    provider: self.name(),
                    status: 200,
                    body: "task succeeded without a video url".to_string(),
                })?;
                Ok(RemoteStatus::Completed(GenerationOutput {
                    url,
                    cost_usd: body.duration.map_or(0.0, |d| {
                        f64::from(d) * VIDEO_RATE_PER_SECOND
                    }),
                }))
            }
            other => Ok(RemoteStatus::Failed {
                code: body.error_code,
                message: body
                    .error_message
                    .unwrap_or_else(|| format!("task ended in state {other}")),
            }),
        }
    }

    fn estimate_cost(&self, input: &GenerationInput) -> Result<f64, ProviderError> {
        match input {
            GenerationInput::Video {
                duration_seconds, ..
            } => Ok(f64::from(*duration_seconds) * VIDEO_RATE_PER_SECOND),
            _ => Err(ProviderError::Unsupported {
                provider: self.name(),
                capability: input.capability(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateTaskRequest {
    model: String,
    prompt: String,
    duration: u32,
}

#[derive(Debug, Deserialize)]
struct CreateTaskResponse {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct TaskStatusResponse {
    status: String,
    video_url: Option<String>,
    duration: Option<u32>,
    error_code: Option<String>,
    error_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> HailuoProvider {
        HailuoProvider::new("hl-test".to_string())
    }

    #[tokio::test]
    async fn text_is_rejected_without_network() {
        let input = GenerationInput::Blog {
            topic: "AI trends".to_string(),
            tone: None,
            length_words: 800,
        };
        let err = provider().submit(&input).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Unsupported {
                provider: "hailuo",
                capability: Capability::Text,
            }
        ));
    }

    #[test]
    fn video_cost_scales_with_duration() {
        let p = provider();
        let base = GenerationInput::Video {
            prompt: "sunset".to_string(),
            duration_seconds: 15,
            style: None,
        };
        let double = GenerationInput::Video {
            prompt: "sunset".to_string(),
            duration_seconds: 30,
            style: None,
        };
        let base_cost = p.estimate_cost(&base).unwrap();
        let double_cost = p.estimate_cost(&double).unwrap();
        assert!((double_cost - base_cost * 2.0).abs() < 1e-9);
    }
}
