//! Document service coordinating the pipelines, the store, and metrics.

use crate::{
    config::Config,
    context::summary_preview,
    extraction::{PdfTextExtractor, TextExtractor},
    llm::{GenerationBackend, OllamaBackend, QueryClient, SummarizationClient, SummarizationSettings},
    metrics::{DocumentMetrics, MetricsSnapshot},
    pipeline::{
        ingest::IngestionPipeline,
        query::QueryPipeline,
        types::{DocumentListing, IngestionReceipt, PipelineError, QueryAnswer},
    },
    store::{DocumentStore, InMemoryDocumentStore},
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Abstraction over document operations used by the HTTP surface.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Extract, summarize, and store an uploaded PDF.
    async fn upload(
        &self,
        filename: String,
        bytes: Vec<u8>,
    ) -> Result<IngestionReceipt, PipelineError>;

    /// List stored documents with summary previews, in storage order.
    async fn list_documents(&self) -> Result<Vec<DocumentListing>, PipelineError>;

    /// Delete a document by identifier.
    async fn delete_document(&self, document_id: &str) -> Result<(), PipelineError>;

    /// Answer a question over the selected documents.
    async fn query(
        &self,
        question: String,
        document_ids: Vec<String>,
    ) -> Result<QueryAnswer, PipelineError>;

    /// Probe the generative-text backend.
    async fn backend_reachable(&self) -> bool;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

/// Timeouts and prompt bounds applied by the service.
#[derive(Debug, Clone, Copy)]
pub struct ServiceSettings {
    /// Summarization prompt and timeout settings.
    pub summarization: SummarizationSettings,
    /// Bound for question-answering calls.
    pub query_timeout: Duration,
    /// Bound for the health probe.
    pub health_timeout: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            summarization: SummarizationSettings::default(),
            query_timeout: Duration::from_secs(120),
            health_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&Config> for ServiceSettings {
    fn from(config: &Config) -> Self {
        Self {
            summarization: SummarizationSettings {
                max_words: config.summary_max_words,
                input_chars: config.summary_input_chars,
                timeout: config.summary_timeout,
            },
            query_timeout: config.query_timeout,
            health_timeout: config.health_timeout,
        }
    }
}

/// Owns the long-lived pipeline components.
///
/// Construct once near process start and share through an `Arc`; every request runs
/// independently against the shared store.
pub struct DocumentService {
    ingestion: IngestionPipeline,
    queries: QueryPipeline,
    store: Arc<dyn DocumentStore>,
    backend: Arc<dyn GenerationBackend>,
    health_timeout: Duration,
    metrics: DocumentMetrics,
}

impl DocumentService {
    /// Wire the service from explicit collaborators.
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        extractor: Arc<dyn TextExtractor>,
        store: Arc<dyn DocumentStore>,
        settings: ServiceSettings,
    ) -> Self {
        let summarizer = SummarizationClient::new(backend.clone(), settings.summarization);
        let query_client = QueryClient::new(backend.clone(), settings.query_timeout);
        Self {
            ingestion: IngestionPipeline::new(extractor, summarizer, store.clone()),
            queries: QueryPipeline::new(store.clone(), query_client),
            store,
            backend,
            health_timeout: settings.health_timeout,
            metrics: DocumentMetrics::new(),
        }
    }

    /// Build the service described by `config`: Ollama backend, `lopdf` extractor, and an
    /// in-memory store optionally backed by a snapshot file.
    pub async fn from_config(config: &Config) -> Result<Self, PipelineError> {
        tracing::info!(url = %config.ollama_url, model = %config.ollama_model, "Initializing backend client");
        let backend = OllamaBackend::new(config.ollama_url.clone(), config.ollama_model.clone())
            .map_err(|error| PipelineError::Internal(format!("HTTP client setup failed: {error}")))?;
        let store = match &config.document_store_path {
            Some(path) => InMemoryDocumentStore::open(path.clone()).await?,
            None => InMemoryDocumentStore::new(),
        };
        Ok(Self::new(
            Arc::new(backend),
            Arc::new(PdfTextExtractor::new()),
            Arc::new(store),
            ServiceSettings::from(config),
        ))
    }

    /// Ingest an uploaded PDF.
    pub async fn upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<IngestionReceipt, PipelineError> {
        let receipt = self.ingestion.ingest(filename, bytes).await?;
        self.metrics.record_ingestion(receipt.summary_degraded);
        Ok(receipt)
    }

    /// List stored documents with their summary previews.
    pub async fn list_documents(&self) -> Result<Vec<DocumentListing>, PipelineError> {
        let documents = self.store.list_all().await?;
        Ok(documents
            .into_iter()
            .map(|document| DocumentListing {
                summary: summary_preview(&document.summary),
                id: document.id,
                filename: document.filename,
            })
            .collect())
    }

    /// Delete a document by identifier.
    pub async fn delete_document(&self, document_id: &str) -> Result<(), PipelineError> {
        let removed = self.store.delete_by_id(document_id).await?;
        self.metrics.record_deletion();
        tracing::info!(document_id = %removed.id, filename = %removed.filename, "Document deleted");
        Ok(())
    }

    /// Answer a question over the selected documents.
    pub async fn query(
        &self,
        question: &str,
        document_ids: &[String],
    ) -> Result<QueryAnswer, PipelineError> {
        let result = self.queries.query(question, document_ids).await;
        match &result {
            Ok(_) => self.metrics.record_query(true),
            Err(PipelineError::BackendUnavailable(_)) => self.metrics.record_query(false),
            Err(_) => {}
        }
        result
    }

    /// Probe the generative-text backend.
    pub async fn backend_reachable(&self) -> bool {
        self.backend.is_reachable(self.health_timeout).await
    }

    /// Return the current metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl DocumentApi for DocumentService {
    async fn upload(
        &self,
        filename: String,
        bytes: Vec<u8>,
    ) -> Result<IngestionReceipt, PipelineError> {
        DocumentService::upload(self, &filename, bytes).await
    }

    async fn list_documents(&self) -> Result<Vec<DocumentListing>, PipelineError> {
        DocumentService::list_documents(self).await
    }

    async fn delete_document(&self, document_id: &str) -> Result<(), PipelineError> {
        DocumentService::delete_document(self, document_id).await
    }

    async fn query(
        &self,
        question: String,
        document_ids: Vec<String>,
    ) -> Result<QueryAnswer, PipelineError> {
        DocumentService::query(self, &question, &document_ids).await
    }

    async fn backend_reachable(&self) -> bool {
        DocumentService::backend_reachable(self).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        DocumentService::metrics_snapshot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::SUMMARY_UNAVAILABLE_MARKER;
    use crate::pipeline::test_support::{ScriptedBackend, StaticExtractor};

    fn service(backend: ScriptedBackend, text: &str) -> DocumentService {
        DocumentService::new(
            Arc::new(backend),
            Arc::new(StaticExtractor::new(text)),
            Arc::new(InMemoryDocumentStore::new()),
            ServiceSettings::default(),
        )
    }

    #[tokio::test]
    async fn degraded_upload_lists_full_short_preview() {
        let service = service(ScriptedBackend::offline(), "Hello world");

        let receipt = service
            .upload("report.pdf", b"pdf".to_vec())
            .await
            .expect("uploaded");
        let listing = service.list_documents().await.expect("list");

        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].id, receipt.document_id);
        assert_eq!(listing[0].filename, "report.pdf");
        assert!(listing[0].summary.starts_with(SUMMARY_UNAVAILABLE_MARKER));
        assert!(!listing[0].summary.ends_with("..."));

        let snapshot = service.metrics_snapshot();
        assert_eq!(snapshot.documents_ingested, 1);
        assert_eq!(snapshot.summaries_degraded, 1);
    }

    #[tokio::test]
    async fn long_summaries_are_truncated_in_listing() {
        let long_summary = "word ".repeat(40);
        let service = service(ScriptedBackend::answering(&long_summary), "Some text");

        service
            .upload("long.pdf", b"pdf".to_vec())
            .await
            .expect("uploaded");
        let listing = service.list_documents().await.expect("list");

        assert_eq!(listing[0].summary.chars().count(), 103);
        assert!(listing[0].summary.ends_with("..."));
    }

    #[tokio::test]
    async fn delete_then_delete_again_is_not_found() {
        let service = service(ScriptedBackend::answering("Summary"), "Text");
        let receipt = service
            .upload("a.pdf", b"pdf".to_vec())
            .await
            .expect("uploaded");

        service
            .delete_document(&receipt.document_id)
            .await
            .expect("deleted");
        let error = service
            .delete_document(&receipt.document_id)
            .await
            .expect_err("gone");

        assert!(matches!(error, PipelineError::NotFound(_)));
        assert_eq!(service.metrics_snapshot().documents_deleted, 1);
    }

    #[tokio::test]
    async fn query_outcomes_are_counted() {
        let service = service(ScriptedBackend::answering("Answer"), "Text");
        let receipt = service
            .upload("a.pdf", b"pdf".to_vec())
            .await
            .expect("uploaded");

        service
            .query("Question?", &[receipt.document_id])
            .await
            .expect("answered");
        let _ = service.query("Question?", &["missing".into()]).await;

        let snapshot = service.metrics_snapshot();
        assert_eq!(snapshot.queries_answered, 1);
        assert_eq!(snapshot.queries_failed, 0);
    }

    #[tokio::test]
    async fn health_reflects_backend() {
        assert!(service(ScriptedBackend::answering("ok"), "x").backend_reachable().await);
        assert!(!service(ScriptedBackend::offline(), "x").backend_reachable().await);
    }
}
