//! Bounded document summaries with an explicit degraded outcome.

use super::{
    GENERATION_TOKEN_CAP, GenerationBackend, GenerationError, GenerationOptions,
    GenerationRequest,
};
use crate::context::char_prefix;
use std::sync::Arc;
use std::time::Duration;

/// Fixed prefix of every placeholder stored when summarization could not complete.
pub const SUMMARY_UNAVAILABLE_MARKER: &str = "Summary unavailable";

const SUMMARY_TEMPERATURE: f64 = 0.7;
const CAUSE_PREVIEW_CHARS: usize = 50;

/// Result of a summarization attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    /// Backend produced a non-empty summary.
    Generated(String),
    /// Backend failed; `placeholder` is stored in place of a summary.
    Degraded {
        /// Marker-prefixed text stored with the document.
        placeholder: String,
        /// Full failure description, for logs.
        cause: String,
    },
}

impl SummaryOutcome {
    /// Build a degraded outcome whose placeholder carries a truncated cause.
    pub fn degraded(cause: impl Into<String>) -> Self {
        let cause = cause.into();
        let placeholder = format!(
            "{SUMMARY_UNAVAILABLE_MARKER} - {}",
            char_prefix(&cause, CAUSE_PREVIEW_CHARS)
        );
        Self::Degraded { placeholder, cause }
    }

    /// Whether the backend failed to summarize.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Text to persist as the document summary. Never empty.
    pub fn into_summary(self) -> String {
        match self {
            Self::Generated(text) => text,
            Self::Degraded { placeholder, .. } => placeholder,
        }
    }
}

/// Prompt and timeout parameters for summaries.
#[derive(Debug, Clone, Copy)]
pub struct SummarizationSettings {
    /// Word budget requested in the prompt (not enforced on the output).
    pub max_words: usize,
    /// Leading characters of the document embedded in the prompt.
    pub input_chars: usize,
    /// Bound applied to the backend call.
    pub timeout: Duration,
}

impl Default for SummarizationSettings {
    fn default() -> Self {
        Self {
            max_words: 50,
            input_chars: 4000,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Produces summaries for extracted document text.
pub struct SummarizationClient {
    backend: Arc<dyn GenerationBackend>,
    settings: SummarizationSettings,
}

impl SummarizationClient {
    /// Wrap a backend with the supplied settings.
    pub fn new(backend: Arc<dyn GenerationBackend>, settings: SummarizationSettings) -> Self {
        Self { backend, settings }
    }

    /// Summarize `text`. Backend failures yield [`SummaryOutcome::Degraded`] instead of an error.
    pub async fn summarize(&self, text: &str) -> SummaryOutcome {
        let request = GenerationRequest {
            prompt: build_summary_prompt(text, self.settings.max_words, self.settings.input_chars),
            options: GenerationOptions {
                temperature: SUMMARY_TEMPERATURE,
                num_predict: GENERATION_TOKEN_CAP,
            },
            timeout: self.settings.timeout,
        };

        match self.backend.generate(request).await {
            Ok(summary) if !summary.is_empty() => SummaryOutcome::Generated(summary),
            Ok(_) => {
                tracing::warn!("Backend returned an empty summary");
                SummaryOutcome::degraded("empty response from backend")
            }
            Err(error) => {
                tracing::warn!(error = %error, "Summarization failed; storing placeholder");
                SummaryOutcome::degraded(describe(&error))
            }
        }
    }
}

fn describe(error: &GenerationError) -> String {
    match error {
        GenerationError::Unreachable { cause, .. } => cause.clone(),
        other => other.to_string(),
    }
}

/// Build the summarization prompt over a bounded prefix of the document.
pub fn build_summary_prompt(text: &str, max_words: usize, input_chars: usize) -> String {
    format!(
        "Summarize this text in {max_words} words: {}",
        char_prefix(text, input_chars)
    )
}
