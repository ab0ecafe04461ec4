//! Error types for the `docqa-rag` crate.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while indexing or querying a document.
#[derive(Debug, Error)]
pub enum RagError {
    /// The source document could not be read or produced no text.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// The embedding collaborator failed.
    ///
    /// `embedded` counts the segments that were embedded successfully before
    /// the failure, so callers can decide whether a partial build is useful.
    #[error("Embedding error ({provider}): {message} ({embedded} segment(s) embedded)")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
        /// Number of segments embedded before the failure.
        embedded: usize,
    },

    /// A search was issued against an index with no vectors.
    #[error("Index is empty")]
    EmptyIndex,

    /// A vector did not match the index dimensionality.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality of the index.
        expected: usize,
        /// Dimensionality of the offending vector.
        actual: usize,
    },

    /// An embedding or generation call exceeded its deadline.
    #[error("Upstream timeout: {operation} exceeded {timeout:?}")]
    UpstreamTimeout {
        /// The operation that timed out (`embedding` or `generation`).
        operation: &'static str,
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// The generation collaborator returned an error.
    #[error("Generation error ({provider}): {message}")]
    Generation {
        /// The generation provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An index snapshot could not be written or read back.
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// An I/O error outside of extraction (e.g. writing a snapshot).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RagError {
    /// Whether the failure is transient and the user should simply try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RagError::Generation { .. } | RagError::UpstreamTimeout { .. })
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_error_reports_partial_count() {
        let err = RagError::Embedding {
            provider: "mock".into(),
            message: "rate limited".into(),
            embedded: 12,
        };
        assert_eq!(
            err.to_string(),
            "Embedding error (mock): rate limited (12 segment(s) embedded)"
        );
    }

    #[test]
    fn only_upstream_failures_are_retryable() {
        let timeout =
            RagError::UpstreamTimeout { operation: "generation", timeout: Duration::from_secs(5) };
        let generation = RagError::Generation { provider: "mock".into(), message: "503".into() };
        assert!(timeout.is_retryable());
        assert!(generation.is_retryable());
        assert!(!RagError::EmptyIndex.is_retryable());
        assert!(!RagError::DimensionMismatch { expected: 3, actual: 4 }.is_retryable());
    }
}
