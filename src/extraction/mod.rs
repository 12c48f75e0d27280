//! Plain-text extraction from uploaded PDF bytes.
//!
//! Every page is extracted in page order and terminated by a newline; the joined result is
//! trimmed. A failure on any page aborts the whole extraction so callers never see partial text.

use async_trait::async_trait;
use lopdf::{Document, Object};
use thiserror::Error;

/// Errors raised while turning PDF bytes into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Bytes could not be parsed as a PDF document.
    #[error("Invalid PDF: {0}")]
    Malformed(String),
    /// A page was present but its text could not be decoded.
    #[error("Failed to extract text from page {page}: {cause}")]
    Page {
        /// One-based page number that failed.
        page: u32,
        /// Message reported by the PDF library.
        cause: String,
    },
    /// The blocking extraction task panicked or was cancelled.
    #[error("PDF extraction aborted: {0}")]
    Aborted(String),
}

/// Interface implemented by text extractors used during ingestion.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract the text layer of the supplied document bytes.
    async fn extract(&self, bytes: Vec<u8>) -> Result<String, ExtractionError>;
}

/// Extractor backed by `lopdf`, running the CPU-bound parse on the blocking pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    /// Construct a new extractor.
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, bytes: Vec<u8>) -> Result<String, ExtractionError> {
        tokio::task::spawn_blocking(move || extract_text(&bytes))
            .await
            .map_err(|error| ExtractionError::Aborted(error.to_string()))?
    }
}

/// Extract the text of every page, each followed by a newline, and trim the result.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let document =
        Document::load_mem(bytes).map_err(|error| ExtractionError::Malformed(error.to_string()))?;
    document_text(&document)
}

fn document_text(document: &Document) -> Result<String, ExtractionError> {
    let mut text = String::new();
    for (page, page_id) in document.get_pages() {
        let page_error = |error: lopdf::Error| ExtractionError::Page {
            page,
            cause: error.to_string(),
        };
        // lopdf skips content streams it cannot resolve, so check them up front.
        for stream_id in document.get_page_contents(page_id) {
            document
                .get_object(stream_id)
                .and_then(Object::as_stream)
                .and_then(|stream| stream.get_plain_content())
                .map_err(page_error)?;
        }
        let page_text = document.extract_text(&[page]).map_err(page_error)?;
        text.push_str(&page_text);
        text.push('\n');
    }

    let text = text.trim().to_string();
    tracing::debug!(chars = text.chars().count(), "Extracted PDF text");
    Ok(text)
}
