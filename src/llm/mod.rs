//! Clients for the Ollama-compatible generative-text backend.
//!
//! [`GenerationBackend`] is the single seam over the wire protocol (`POST /api/generate`,
//! `GET /api/tags`). The summarization and query clients build prompts and decoding options on
//! top of it and differ in how they report failures.

pub mod query;
pub mod summarize;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub use query::{QueryClient, QueryError};
pub use summarize::{
    SUMMARY_UNAVAILABLE_MARKER, SummarizationClient, SummarizationSettings, SummaryOutcome,
};

/// Upper bound on generated tokens shared by both call types.
pub const GENERATION_TOKEN_CAP: u32 = 500;

/// Errors surfaced by a single generation call.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Backend could not be reached.
    #[error("backend unreachable at {url}: {cause}")]
    Unreachable {
        /// Endpoint we attempted to call.
        url: String,
        /// Transport error message.
        cause: String,
    },
    /// Backend did not answer within the configured bound.
    #[error("backend timed out after {0:?}")]
    Timeout(Duration),
    /// Backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status {
        /// HTTP status returned by the backend.
        status: StatusCode,
        /// Response body, possibly empty.
        body: String,
    },
    /// Backend answered successfully but the body could not be decoded.
    #[error("malformed backend response: {0}")]
    InvalidResponse(String),
}

/// Decoding parameters forwarded under `options`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationOptions {
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum number of generated tokens.
    pub num_predict: u32,
}

/// One non-streaming generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Fully assembled prompt.
    pub prompt: String,
    /// Decoding parameters.
    pub options: GenerationOptions,
    /// Bound applied to the whole request.
    pub timeout: Duration,
}

/// Interface implemented by generative-text backends.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text for the prompt and return it trimmed.
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError>;

    /// Report whether the backend answers its status endpoint within `timeout`.
    async fn is_reachable(&self, timeout: Duration) -> bool;
}

/// HTTP client for an Ollama runtime.
pub struct OllamaBackend {
    http: Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct GeneratePayload<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerationOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaBackend {
    /// Build a client targeting `base_url` and generating with `model`.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().user_agent("pdfchat/0.1").build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let model = model.into();
        tracing::debug!(url = %base_url, model = %model, "Initialized Ollama client");
        Ok(Self {
            http,
            base_url,
            model,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn transport_error(url: String, error: reqwest::Error, timeout: Duration) -> GenerationError {
    if error.is_timeout() {
        GenerationError::Timeout(timeout)
    } else {
        GenerationError::Unreachable {
            url,
            cause: error.to_string(),
        }
    }
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let url = self.endpoint("/api/generate");
        let payload = GeneratePayload {
            model: &self.model,
            prompt: &request.prompt,
            stream: false,
            options: request.options,
        };

        let response = self
            .http
            .post(&url)
            .timeout(request.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|error| transport_error(url.clone(), error, request.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status { status, body });
        }

        let body: GenerateResponse = response.json().await.map_err(|error| {
            if error.is_timeout() {
                GenerationError::Timeout(request.timeout)
            } else {
                GenerationError::InvalidResponse(error.to_string())
            }
        })?;

        Ok(body.response.trim().to_string())
    }

    async fn is_reachable(&self, timeout: Duration) -> bool {
        let url = self.endpoint("/api/tags");
        match self.http.get(&url).timeout(timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(error) => {
                tracing::warn!(url = %url, error = %error, "Backend health probe failed");
                false
            }
        }
    }
}
