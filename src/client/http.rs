//! HTTP-backed snapshot source for the poller, speaking the backend's
//! generation API.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use uuid::Uuid;

use super::poller::{JobStatusSource, SourceError};
use crate::modules::generation::dto::JobSnapshot;

/// Response envelope the backend wraps every payload in.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[allow(dead_code)]
    status: String,
    message: String,
    data: Option<T>,
}

pub struct HttpJobSource {
    http: reqwest::Client,
    base_url: String,
    bearer_token: SecretString,
}

impl std::fmt::Debug for HttpJobSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpJobSource")
            .field("base_url", &self.base_url)
            .field("bearer_token", &"[REDACTED]")
            .finish()
    }
}

impl HttpJobSource {
    pub fn new(base_url: impl Into<String>, bearer_token: SecretString) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token,
        }
    }

    fn job_url(&self, job_id: Uuid) -> String {
        format!("{}/api/v1/generation/jobs/{job_id}", self.base_url)
    }

    async fn unwrap_snapshot(
        response: reqwest::Response,
    ) -> Result<JobSnapshot, SourceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError(describe_failure(status, &body)));
        }
        let envelope: Envelope<JobSnapshot> = response
            .json()
            .await
            .map_err(|e| SourceError(format!("malformed snapshot payload: {e}")))?;
        envelope
            .data
            .ok_or_else(|| SourceError(format!("empty snapshot payload: {}", envelope.message)))
    }
}

fn describe_failure(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => format!("{status}: {}", parsed.message),
        Err(_) => format!("{status}"),
    }
}

#[async_trait]
impl JobStatusSource for HttpJobSource {
    async fn fetch(&self, job_id: Uuid) -> Result<JobSnapshot, SourceError> {
        let response = self
            .http
            .get(self.job_url(job_id))
            .bearer_auth(self.bearer_token.expose_secret())
            .send()
            .await
            .map_err(|e| SourceError(e.to_string()))?;
        Self::unwrap_snapshot(response).await
    }

    async fn cancel(&self, job_id: Uuid) -> Result<JobSnapshot, SourceError> {
        let response = self
            .http
            .post(format!("{}/cancel", self.job_url(job_id)))
            .bearer_auth(self.bearer_token.expose_secret())
            .send()
            .await
            .map_err(|e| SourceError(e.to_string()))?;
        Self::unwrap_snapshot(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_in_base_url_is_normalized() {
        let source = HttpJobSource::new(
            "https://api.burstlet.com/",
            SecretString::from("token"),
        );
        let id = Uuid::nil();
        assert_eq!(
            source.job_url(id),
            format!("https://api.burstlet.com/api/v1/generation/jobs/{id}")
        );
    }

    #[test]
    fn debug_never_prints_the_token() {
        let source = HttpJobSource::new(
            "https://api.burstlet.com",
            SecretString::from("super-secret"),
        );
        let printed = format!("{source:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("[REDACTED]"));
    }

    #[test]
    fn error_body_message_is_surfaced() {
        let described = describe_failure(
            StatusCode::NOT_FOUND,
            r#"{"status":"error","message":"job not found","data":null}"#,
        );
        assert!(described.contains("job not found"));
    }
}
