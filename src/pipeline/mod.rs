//! Ingestion and query pipelines plus the service shared by the HTTP surface.

pub mod ingest;
pub mod query;
mod service;
pub mod types;

pub use ingest::IngestionPipeline;
pub use query::QueryPipeline;
pub use service::{DocumentApi, DocumentService, ServiceSettings};
pub use types::{DocumentListing, IngestionReceipt, PipelineError, QueryAnswer, STATUS_SUCCESS};
