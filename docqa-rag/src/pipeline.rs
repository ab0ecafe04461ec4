//! Per-document question-answering session.
//!
//! A [`DocumentSession`] coordinates ingestion (extract → chunk → embed →
//! index) and querying (embed → search → compose) for one document at a
//! time. The index sits behind a `tokio::sync::RwLock`: a rebuild happens
//! off-lock and is swapped in under the write lock, while queries share the
//! read lock.
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{DocumentSession, DocumentSource, RagConfig};
//!
//! let session = DocumentSession::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .generation_provider(Arc::new(my_model))
//!     .build()?;
//!
//! let report = session.ingest(&DocumentSource::path("handbook.pdf")).await?;
//! let answer = session.ask("How many leave days do I get?", 4).await?;
//! ```

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::chunking::{BoundaryChunker, Chunker};
use crate::composer::AnswerComposer;
use crate::config::RagConfig;
use crate::document::{Answer, Document, RetrievalResult, Segment};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::extract::{DocumentSource, extract};
use crate::generation::GenerationProvider;
use crate::index::{FlatIndex, SegmentIndex};
use crate::retriever::Retriever;
use crate::snapshot::IndexSnapshot;
use crate::upstream::with_deadline;

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// ID of the ingested document.
    pub document_id: String,
    /// Number of segments now searchable.
    pub segments: usize,
}

/// Snapshot of a session's state for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// ID of the indexed document, if any.
    pub document_id: Option<String>,
    /// Number of indexed segments.
    pub segments: usize,
    /// Dimensionality of the index, if fixed.
    pub dimensions: Option<usize>,
    /// Name of the embedding provider.
    pub embedding_provider: String,
    /// Name of the generation provider.
    pub generation_provider: String,
}

#[derive(Debug, Default)]
struct IndexedDocument {
    document_id: Option<String>,
    index: SegmentIndex,
}

/// Question answering over a single document.
///
/// Construct one via [`DocumentSession::builder()`]. Each session owns its
/// own index; nothing is shared between sessions.
pub struct DocumentSession {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    generation_provider: Arc<dyn GenerationProvider>,
    chunker: Arc<dyn Chunker>,
    composer: AnswerComposer,
    state: RwLock<IndexedDocument>,
}

impl DocumentSession {
    /// Create a new [`DocumentSessionBuilder`].
    pub fn builder() -> DocumentSessionBuilder {
        DocumentSessionBuilder::default()
    }

    /// Return a reference to the session configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Extract, chunk, embed, and index a document source.
    ///
    /// Replaces whatever was indexed before. A document whose text yields no
    /// segments leaves the session with an empty index.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Extraction`] if the source cannot be read, and the
    /// errors of [`ingest_document`](DocumentSession::ingest_document).
    pub async fn ingest(&self, source: &DocumentSource) -> Result<IngestReport> {
        let document = extract(source).inspect_err(|e| {
            error!(error = %e, "extraction failed");
        })?;
        self.ingest_document(document).await
    }

    /// Index already-extracted text under `id`.
    ///
    /// # Errors
    ///
    /// Same as [`ingest_document`](DocumentSession::ingest_document), plus
    /// [`RagError::Extraction`] for blank text.
    pub async fn ingest_text(&self, id: &str, text: &str) -> Result<IngestReport> {
        if text.trim().is_empty() {
            return Err(RagError::Extraction(format!("document '{id}' has no text")));
        }
        self.ingest_document(Document::new(id, text)).await
    }

    /// Chunk, embed, and index an extracted document.
    ///
    /// The new index is built without holding the lock and only published
    /// once every segment has been embedded.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] (with the count of segments embedded
    /// before the failure), [`RagError::UpstreamTimeout`], or
    /// [`RagError::DimensionMismatch`]. The previous index stays in place.
    pub async fn ingest_document(&self, document: Document) -> Result<IngestReport> {
        let index = self.build_index(&document).await?;
        let segments = index.len();

        let mut state = self.state.write().await;
        *state = IndexedDocument { document_id: Some(document.id.clone()), index };

        if segments == 0 {
            warn!(document.id = %document.id, "no content indexed");
        } else {
            info!(document.id = %document.id, segment_count = segments, "ingested document");
        }
        Ok(IngestReport { document_id: document.id, segments })
    }

    async fn build_index(&self, document: &Document) -> Result<SegmentIndex> {
        let segments = self.chunker.chunk(document);
        let mut index = SegmentIndex::with_index(Box::new(FlatIndex::with_dimensions(
            self.config.metric,
            self.embedding_provider.dimensions(),
        )))?;
        if segments.is_empty() {
            return Ok(index);
        }

        let vectors = self.embed_segments(&document.id, &segments).await?;
        index.add(segments, vectors)?;
        Ok(index)
    }

    /// Embed segment texts in batches, failing fast on the first error.
    async fn embed_segments(
        &self,
        document_id: &str,
        segments: &[Segment],
    ) -> Result<Vec<Vec<f32>>> {
        let provider = self.embedding_provider.name().to_string();
        let mut vectors = Vec::with_capacity(segments.len());

        for batch in segments.chunks(self.config.embedding_batch_size) {
            let texts: Vec<&str> = batch.iter().map(|s| s.text.as_str()).collect();
            let embedded = vectors.len();

            let batch_vectors = with_deadline(
                "embedding",
                self.config.embedding_timeout(),
                self.embedding_provider.embed_batch(&texts),
            )
            .await
            .map_err(|e| {
                error!(
                    document.id = %document_id,
                    embedded,
                    error = %e,
                    "embedding failed during ingestion"
                );
                match e {
                    RagError::Embedding { provider, message, .. } => {
                        RagError::Embedding { provider, message, embedded }
                    }
                    other => other,
                }
            })?;

            if batch_vectors.len() != texts.len() {
                error!(
                    document.id = %document_id,
                    expected = texts.len(),
                    actual = batch_vectors.len(),
                    "embedding provider returned wrong batch size"
                );
                return Err(RagError::Embedding {
                    provider,
                    message: format!(
                        "expected {} vector(s), got {}",
                        texts.len(),
                        batch_vectors.len()
                    ),
                    embedded,
                });
            }
            vectors.extend(batch_vectors);
        }

        Ok(vectors)
    }

    /// Return up to `k` segments relevant to `query`, nearest first.
    ///
    /// An empty index yields an empty result.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `k == 0`, otherwise the errors of
    /// [`Retriever::retrieve`].
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        if k == 0 {
            return Err(RagError::Config("k must be greater than zero".to_string()));
        }
        let state = self.state.read().await;
        Retriever::new(&state.index, self.embedding_provider.as_ref())
            .with_timeout(self.config.embedding_timeout())
            .retrieve(query, k)
            .await
    }

    /// Answer `query` from the `k` most relevant segments.
    ///
    /// With nothing indexed the generation model is not called and the fixed
    /// [`NO_DOCUMENT_ANSWER`](crate::NO_DOCUMENT_ANSWER) is returned.
    ///
    /// # Errors
    ///
    /// Errors of [`retrieve`](DocumentSession::retrieve) and
    /// [`AnswerComposer::compose`].
    pub async fn ask(&self, query: &str, k: usize) -> Result<Answer> {
        let hits = self.retrieve(query, k).await?;
        let answer = self.composer.compose(query, &hits).await?;
        info!(source_count = answer.sources.len(), "query answered");
        Ok(answer)
    }

    /// Number of indexed segments.
    pub async fn segment_count(&self) -> usize {
        self.state.read().await.index.len()
    }

    /// Capture the current index for persistence.
    pub async fn snapshot(&self) -> IndexSnapshot {
        IndexSnapshot::capture(&self.state.read().await.index)
    }

    /// Replace the current index with one restored from `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if the snapshot was built with
    /// a provider of different dimensionality, or the errors of
    /// [`IndexSnapshot::restore`].
    pub async fn restore(&self, snapshot: IndexSnapshot) -> Result<()> {
        let expected = self.embedding_provider.dimensions();
        if let Some(actual) = snapshot.dimensions.filter(|d| *d != expected) {
            return Err(RagError::DimensionMismatch { expected, actual });
        }

        let index = snapshot.restore()?;
        let document_id = index.segments().first().map(|s| s.document_id.clone());
        info!(document.id = ?document_id, segment_count = index.len(), "restored index");

        *self.state.write().await = IndexedDocument { document_id, index };
        Ok(())
    }

    /// Summarize the session state.
    pub async fn health(&self) -> HealthReport {
        let state = self.state.read().await;
        HealthReport {
            document_id: state.document_id.clone(),
            segments: state.index.len(),
            dimensions: state.index.vectors().dimensions(),
            embedding_provider: self.embedding_provider.name().to_string(),
            generation_provider: self.generation_provider.name().to_string(),
        }
    }
}

/// Builder for constructing a [`DocumentSession`].
///
/// `config`, `embedding_provider`, and `generation_provider` are required.
/// The chunker defaults to a [`BoundaryChunker`] built from the config.
#[derive(Default)]
pub struct DocumentSessionBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    generation_provider: Option<Arc<dyn GenerationProvider>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl DocumentSessionBuilder {
    /// Set the session configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the generation provider.
    pub fn generation_provider(mut self, provider: Arc<dyn GenerationProvider>) -> Self {
        self.generation_provider = Some(provider);
        self
    }

    /// Override the chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`DocumentSession`], validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required field is missing or the
    /// configuration is invalid.
    pub fn build(self) -> Result<DocumentSession> {
        let config =
            self.config.ok_or_else(|| RagError::Config("config is required".to_string()))?;
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let generation_provider = self
            .generation_provider
            .ok_or_else(|| RagError::Config("generation_provider is required".to_string()))?;
        let chunker =
            self.chunker.unwrap_or_else(|| Arc::new(BoundaryChunker::from_config(&config)));

        let composer = AnswerComposer::new(Arc::clone(&generation_provider))
            .with_system_prompt(config.system_prompt.clone())
            .with_timeout(config.generation_timeout());

        Ok(DocumentSession {
            config,
            embedding_provider,
            generation_provider,
            chunker,
            composer,
            state: RwLock::new(IndexedDocument::default()),
        })
    }
}
