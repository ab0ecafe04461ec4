//! Query-time retrieval over a built [`SegmentIndex`].

use std::time::Duration;

use tracing::debug;

use crate::document::RetrievalResult;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::SegmentIndex;
use crate::upstream::with_deadline;

/// Embeds a query and returns the nearest segments of one index.
///
/// Holds shared references only; the index is never mutated.
pub struct Retriever<'a> {
    index: &'a SegmentIndex,
    embedder: &'a dyn EmbeddingProvider,
    timeout: Option<Duration>,
}

impl<'a> Retriever<'a> {
    /// Create a retriever over `index` using `embedder` for queries.
    pub fn new(index: &'a SegmentIndex, embedder: &'a dyn EmbeddingProvider) -> Self {
        Self { index, embedder, timeout: None }
    }

    /// Bound the query embedding call.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Return up to `k` segments most relevant to `query`, nearest first.
    ///
    /// An empty index yields an empty result without calling the embedder.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] or [`RagError::UpstreamTimeout`] if the
    /// query cannot be embedded, and [`RagError::DimensionMismatch`] if the
    /// embedder and index disagree on dimensionality.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        if self.index.is_empty() {
            debug!("retrieval skipped: nothing indexed");
            return Ok(Vec::new());
        }

        let embedding =
            with_deadline("embedding", self.timeout, self.embedder.embed(query)).await?;

        match self.index.search(&embedding, k) {
            Ok(hits) => {
                debug!(k, hit_count = hits.len(), "retrieved segments");
                Ok(hits)
            }
            Err(RagError::EmptyIndex) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}
