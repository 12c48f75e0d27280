//! Upload ingestion: extract, validate, summarize, store.

use crate::{
    extraction::TextExtractor,
    llm::SummarizationClient,
    pipeline::types::{IngestionReceipt, PipelineError, STATUS_SUCCESS},
    store::{Document, DocumentStore},
};
use std::sync::Arc;

/// Orchestrates one upload from raw bytes to a stored record.
pub struct IngestionPipeline {
    extractor: Arc<dyn TextExtractor>,
    summarizer: SummarizationClient,
    store: Arc<dyn DocumentStore>,
}

impl IngestionPipeline {
    /// Assemble the pipeline from its collaborators.
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        summarizer: SummarizationClient,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            extractor,
            summarizer,
            store,
        }
    }

    /// Ingest `bytes` uploaded as `filename`.
    ///
    /// Extraction failures and blank text abort before any backend call or write. Summarization
    /// never aborts: a failed call stores the unavailable placeholder instead.
    pub async fn ingest(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<IngestionReceipt, PipelineError> {
        tracing::debug!(filename, bytes = bytes.len(), "Upload received");

        let text = self.extractor.extract(bytes).await.map_err(|error| {
            tracing::warn!(filename, error = %error, "PDF extraction failed");
            PipelineError::from(error)
        })?;
        tracing::debug!(filename, chars = text.chars().count(), "Text extracted");

        if text.trim().is_empty() {
            tracing::warn!(filename, "PDF has no extractable text");
            return Err(PipelineError::EmptyContent);
        }

        let outcome = self.summarizer.summarize(&text).await;
        let summary_degraded = outcome.is_degraded();
        tracing::debug!(filename, degraded = summary_degraded, "Summary produced");

        let document = Document::new(filename, outcome.into_summary());
        let document_id = document.id.clone();
        self.store.insert(document).await.map_err(|error| {
            tracing::error!(document_id = %document_id, error = %error, "Failed to store document");
            PipelineError::from(error)
        })?;

        tracing::info!(
            document_id = %document_id,
            filename,
            degraded = summary_degraded,
            "Document stored"
        );
        Ok(IngestionReceipt {
            document_id,
            filename: filename.to_string(),
            status: STATUS_SUCCESS.to_string(),
            message: "PDF processed and stored successfully".to_string(),
            summary_degraded,
        })
    }
}
