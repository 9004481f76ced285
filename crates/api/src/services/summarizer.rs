//! Page summaries through a generative-text service (Gemini `generateContent`).

use async_trait::async_trait;
use domain::models::summary::FALLBACK_SUMMARY;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::SummarizerConfig;

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("Summarizer API key not configured")]
    NotConfigured,

    #[error("Summarizer request failed: {0}")]
    Request(String),

    #[error("Summarizer returned {status}: {body}")]
    Upstream { status: u16, body: String },
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Sends the prompt and returns the first candidate text verbatim.
    async fn summarize(&self, prompt: &str) -> Result<String, SummarizeError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
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
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

pub struct GeminiSummarizer {
    config: SummarizerConfig,
    client: reqwest::Client,
}

impl GeminiSummarizer {
    pub fn new(config: SummarizerConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, prompt: &str) -> Result<String, SummarizeError> {
        if self.config.api_key.is_empty() {
            return Err(SummarizeError::NotConfigured);
        }

        let payload = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SummarizeError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizeError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| SummarizeError::Request(e.to_string()))?;

        Ok(parsed
            .first_text()
            .unwrap_or_else(|| FALLBACK_SUMMARY.to_string()))
    }
}
