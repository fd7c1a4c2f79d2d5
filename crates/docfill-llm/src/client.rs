//! Google AI Studio (`generateContent`) REST client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
/// Tried after the configured model is exhausted.
const FALLBACK_MODEL: &str = "gemini-2.0-flash";

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Failed to reach AI Studio: {0}")]
    Transport(String),

    #[error("AI Studio error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("AI Studio returned an empty response")]
    EmptyResponse,
}

impl LlmError {
    /// Transient failures worth another attempt against the same model.
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::EmptyResponse => false,
        }
    }
}

/// Text generation seam; the schema endpoint is tested against an in-process
/// implementation of this trait.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate's parts.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// HTTP client for AI Studio requests.
#[derive(Debug, Clone)]
pub struct AiStudioClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl AiStudioClient {
    pub fn new(api_key: String, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key,
            model,
        }
    }

    async fn generate_once(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig { temperature: 0.2 },
        };

        let response = self
            .client
            .post(format!("{API_BASE}/{model}:generateContent"))
            .header("X-Goog-Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let text = parsed.text();
        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }

    /// Run the bounded retry schedule against one model.
    async fn generate_with_retries(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let mut backoff = Duration::from_millis(INITIAL_BACKOFF_MS);
        let mut last_err = LlmError::EmptyResponse;

        for attempt in 1..=MAX_ATTEMPTS {
            match self.generate_once(model, prompt).await {
                Ok(text) => return Ok(text),
                Err(err) => {
                    let retry = err.is_retryable() && attempt < MAX_ATTEMPTS;
                    warn!(model, attempt, error = %err, retry, "AI Studio request failed");
                    last_err = err;
                    if !retry {
                        break;
                    }
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }

        Err(last_err)
    }
}

#[async_trait]
impl LlmClient for AiStudioClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        match self.generate_with_retries(&self.model, prompt).await {
            Ok(text) => Ok(text),
            Err(primary_err) if self.model != FALLBACK_MODEL => {
                warn!(
                    model = %self.model,
                    fallback = FALLBACK_MODEL,
                    error = %primary_err,
                    "primary model exhausted, trying fallback model"
                );
                self.generate_with_retries(FALLBACK_MODEL, prompt).await
            }
            Err(err) => Err(err),
        }
    }
}
