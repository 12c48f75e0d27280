//! Error taxonomy and result types shared by the pipelines and the HTTP surface.

use crate::{extraction::ExtractionError, llm::QueryError, store::StoreError};
use serde::Serialize;
use thiserror::Error;

/// Status string returned on successful operations.
pub const STATUS_SUCCESS: &str = "success";

/// Errors emitted by ingestion, query, and document management operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Upload was not a readable PDF.
    #[error("Could not read PDF: {0}")]
    ExtractionFailure(#[from] ExtractionError),
    /// PDF parsed but carries no extractable text.
    #[error("No text could be extracted from the PDF")]
    EmptyContent,
    /// The language model could not answer a query.
    #[error(transparent)]
    BackendUnavailable(#[from] QueryError),
    /// Delete targeted an unknown identifier.
    #[error("Document not found: {0}")]
    NotFound(String),
    /// Query selected no stored documents.
    #[error("No documents found for the requested ids")]
    NoMatchingDocuments,
    /// Generated identifier collided with a stored record.
    #[error("Document id collision: {0}")]
    DuplicateIdentifier(String),
    /// Upload body exceeded the configured size limit.
    #[error("File too large: uploads are limited to {0} bytes")]
    UploadTooLarge(usize),
    /// Request failed validation before reaching a pipeline.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// Unexpected failure inside the service.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for PipelineError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateIdentifier(id) => Self::DuplicateIdentifier(id),
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Persistence(message) => Self::Internal(message),
        }
    }
}

/// Outcome of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionReceipt {
    /// Identifier assigned to the stored document.
    pub document_id: String,
    /// Original upload name.
    pub filename: String,
    /// Always [`STATUS_SUCCESS`].
    pub status: String,
    /// Human-readable confirmation.
    pub message: String,
    /// Whether the stored summary is the unavailable placeholder.
    #[serde(skip)]
    pub summary_degraded: bool,
}

/// Answer produced for a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryAnswer {
    /// Trimmed backend response.
    pub response: String,
    /// Always [`STATUS_SUCCESS`].
    pub status: String,
}

/// Listing entry with a shortened summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentListing {
    /// Document identifier.
    pub id: String,
    /// Original upload name.
    pub filename: String,
    /// Summary preview (see [`crate::context::summary_preview`]).
    pub summary: String,
}
