use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::brief::NarrativeBrief;
use crate::config::NarrativeConfig;

/// Prefix of the text substituted for the narrative when the provider fails
pub const FAILURE_PREFIX: &str = "Error al obtener análisis de IA";

#[derive(Error, Debug)]
pub enum NarrativeError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

impl NarrativeError {
    /// Transport faults, rate limiting, and provider-side errors are worth one more try
    pub fn is_transient(&self) -> bool {
        match self {
            NarrativeError::Request(e) => !e.is_decode() && !e.is_builder(),
            NarrativeError::Status { status, .. } => *status == 429 || *status >= 500,
            NarrativeError::MalformedResponse(_) => false,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completions provider
#[derive(Clone)]
pub struct NarrativeGenerator {
    client: reqwest::Client,
    config: NarrativeConfig,
}

impl NarrativeGenerator {
    pub fn new(config: NarrativeConfig) -> Result<Self, NarrativeError> {
        let client = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Narrative text for a brief; provider failures become a descriptive string
    #[instrument(skip(self, brief), fields(target = %brief.target))]
    pub async fn generate(&self, brief: &NarrativeBrief) -> String {
        let prompt = brief.to_string();
        debug!("Narrative brief:\n{}", prompt);

        match self.complete(&prompt).await {
            Ok(text) => {
                info!("Narrative generated ({} chars)", text.len());
                text
            }
            Err(e) => {
                warn!("Narrative generation failed: {}", e);
                format!("{FAILURE_PREFIX}: {e}")
            }
        }
    }

    /// One completion, retried at most `max_retries` times on transient faults
    pub async fn complete(&self, prompt: &str) -> Result<String, NarrativeError> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(500))
            .with_max_delay(Duration::from_secs(5))
            .with_max_times(self.config.max_retries);

        (|| self.request_once(prompt))
            .retry(backoff)
            .sleep(tokio::time::sleep)
            .when(NarrativeError::is_transient)
            .notify(|err: &NarrativeError, delay: Duration| {
                warn!("Narrative request failed, retrying in {:?}: {}", delay, err);
            })
            .await
    }

    async fn request_once(&self, prompt: &str) -> Result<String, NarrativeError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!("Sending completion request to {}", self.endpoint());
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.title)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        debug!("Received HTTP response with status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NarrativeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| NarrativeError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| NarrativeError::MalformedResponse("no completion content".to_string()))
    }
}
