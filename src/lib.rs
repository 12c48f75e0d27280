#![deny(missing_docs)]

//! Core library for the pdfchat document question-answering server.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Query context assembly and summary previews.
pub mod context;
/// PDF text extraction.
pub mod extraction;
/// Generative-text backend clients.
pub mod llm;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion and query counters.
pub mod metrics;
/// Ingestion and query pipelines.
pub mod pipeline;
/// Caller-owned chat session state used by clients.
pub mod session;
/// Document record storage.
pub mod store;
