//! Question answering over stored document summaries.

use crate::{
    context::assemble_context,
    llm::QueryClient,
    pipeline::types::{PipelineError, QueryAnswer, STATUS_SUCCESS},
    store::DocumentStore,
};
use std::sync::Arc;

/// Orchestrates fetch, context assembly, and the backend call for one question.
pub struct QueryPipeline {
    store: Arc<dyn DocumentStore>,
    client: QueryClient,
}

impl QueryPipeline {
    /// Assemble the pipeline from its collaborators.
    pub fn new(store: Arc<dyn DocumentStore>, client: QueryClient) -> Self {
        Self { store, client }
    }

    /// Answer `question` using the summaries of `document_ids`.
    ///
    /// Fails with [`PipelineError::NoMatchingDocuments`] before touching the backend when no id
    /// resolves to a stored document.
    pub async fn query(
        &self,
        question: &str,
        document_ids: &[String],
    ) -> Result<QueryAnswer, PipelineError> {
        if question.trim().is_empty() {
            return Err(PipelineError::InvalidRequest(
                "query must not be empty".to_string(),
            ));
        }
        if document_ids.is_empty() {
            return Err(PipelineError::NoMatchingDocuments);
        }

        let documents = self.store.fetch_by_ids(document_ids).await?;
        if documents.is_empty() {
            tracing::info!(requested = document_ids.len(), "Query matched no documents");
            return Err(PipelineError::NoMatchingDocuments);
        }

        let context = assemble_context(&documents);
        tracing::debug!(
            requested = document_ids.len(),
            matched = documents.len(),
            context_chars = context.chars().count(),
            "Context assembled"
        );

        let response = self.client.answer(question, &context).await.map_err(|error| {
            tracing::warn!(error = %error, "Query backend call failed");
            PipelineError::from(error)
        })?;

        Ok(QueryAnswer {
            response,
            status: STATUS_SUCCESS.to_string(),
        })
    }
}
