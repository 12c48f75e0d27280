use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing ingestion and query activity.
#[derive(Default)]
pub struct DocumentMetrics {
    documents_ingested: AtomicU64,
    summaries_degraded: AtomicU64,
    documents_deleted: AtomicU64,
    queries_answered: AtomicU64,
    queries_failed: AtomicU64,
}

impl DocumentMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stored document, noting whether its summary fell back to the placeholder.
    pub fn record_ingestion(&self, degraded: bool) {
        self.documents_ingested.fetch_add(1, Ordering::Relaxed);
        if degraded {
            self.summaries_degraded.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a successful delete.
    pub fn record_deletion(&self) {
        self.documents_deleted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of a question sent to the backend.
    pub fn record_query(&self, answered: bool) {
        let counter = if answered {
            &self.queries_answered
        } else {
            &self.queries_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_ingested: self.documents_ingested.load(Ordering::Relaxed),
            summaries_degraded: self.summaries_degraded.load(Ordering::Relaxed),
            documents_deleted: self.documents_deleted.load(Ordering::Relaxed),
            queries_answered: self.queries_answered.load(Ordering::Relaxed),
            queries_failed: self.queries_failed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of the counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Documents stored since startup.
    pub documents_ingested: u64,
    /// Stored documents whose summary is the unavailable placeholder.
    pub summaries_degraded: u64,
    /// Documents removed since startup.
    pub documents_deleted: u64,
    /// Questions answered by the backend.
    pub queries_answered: u64,
    /// Questions that reached the backend but failed.
    pub queries_failed: u64,
}
