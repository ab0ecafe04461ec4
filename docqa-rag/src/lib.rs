//! # docqa-rag
//!
//! Question answering over a single uploaded document.
//!
//! A document is extracted to text, split into overlapping segments on
//! sentence boundaries, embedded, and held in an exact in-memory vector
//! index. Questions are answered by retrieving the nearest segments and
//! asking a generation model to answer from them alone.
//!
//! ## Features
//!
//! - `openai` - [`OpenAIEmbeddingProvider`](openai::OpenAIEmbeddingProvider)
//!   and [`OpenAIChatProvider`](openai::OpenAIChatProvider)
//! - `pdf` - PDF text extraction via `lopdf`
//! - `full` - all of the above
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa_rag::{DocumentSession, DocumentSource, RagConfig};
//!
//! let session = DocumentSession::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .generation_provider(Arc::new(my_model))
//!     .build()?;
//!
//! session.ingest(&DocumentSource::path("policy.txt")).await?;
//! let answer = session.ask("What is the refund window?", 4).await?;
//! println!("{}", answer.answer);
//! ```

pub mod chunking;
pub mod composer;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod generation;
pub mod index;
pub mod message;
pub mod pipeline;
pub mod retriever;
pub mod snapshot;

mod upstream;

#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::{BoundaryChunker, Chunker};
pub use composer::{AnswerComposer, NO_DOCUMENT_ANSWER, build_prompt};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Answer, Document, RetrievalResult, RetrievedSegment, Segment, Source};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use extract::{DocumentSource, SourceKind, extract};
pub use generation::GenerationProvider;
pub use index::{DistanceMetric, FlatIndex, Neighbor, SegmentIndex, VectorIndex};
pub use message::{ChatMessage, normalize_turns};
pub use pipeline::{DocumentSession, DocumentSessionBuilder, HealthReport, IngestReport};
pub use retriever::Retriever;
pub use snapshot::IndexSnapshot;
