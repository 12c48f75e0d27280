//! Question answering over an assembled document context.

use super::{
    GENERATION_TOKEN_CAP, GenerationBackend, GenerationError, GenerationOptions,
    GenerationRequest,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const QUERY_TEMPERATURE: f64 = 0.5;

/// Errors surfaced to callers when a question cannot be answered.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Backend was unreachable, timed out, or answered with a failure.
    #[error("Language model unavailable: {0}")]
    BackendUnavailable(#[from] GenerationError),
}

/// Sends questions plus document context to the backend.
pub struct QueryClient {
    backend: Arc<dyn GenerationBackend>,
    timeout: Duration,
}

impl QueryClient {
    /// Wrap a backend with the given per-call timeout.
    pub fn new(backend: Arc<dyn GenerationBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Answer `question` using `context`. Callers must not pass an empty context.
    pub async fn answer(&self, question: &str, context: &str) -> Result<String, QueryError> {
        debug_assert!(!context.is_empty(), "query context must not be empty");
        let request = GenerationRequest {
            prompt: build_query_prompt(context, question),
            options: GenerationOptions {
                temperature: QUERY_TEMPERATURE,
                num_predict: GENERATION_TOKEN_CAP,
            },
            timeout: self.timeout,
        };
        Ok(self.backend.generate(request).await?)
    }
}

/// Build the question-answering prompt.
pub fn build_query_prompt(context: &str, question: &str) -> String {
    format!("Based on this context: {context}\n\nAnswer this question: {question}")
}
