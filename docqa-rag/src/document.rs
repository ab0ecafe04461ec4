//! Data types for documents, segments, and retrieval results.

use serde::{Deserialize, Serialize};

/// A source document after text extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The extracted text content.
    pub text: String,
    /// Optional identifier of the original source (file name, URI).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Document {
    /// Create a document from already-extracted text.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), source: None }
    }

    /// Attach a source identifier.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// A contiguous slice of a [`Document`]'s text, the unit of retrieval.
///
/// `start` and `end` are character offsets into the document text; `text`
/// holds exactly the characters in `[start, end)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Segment {
    /// The ID of the parent [`Document`].
    pub document_id: String,
    /// Position of this segment among the document's segments.
    pub sequence: usize,
    /// Character offset of the first character.
    pub start: usize,
    /// Character offset one past the last character.
    pub end: usize,
    /// The segment text.
    pub text: String,
    /// Source identifier inherited from the parent document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Segment {
    /// Length of the segment in characters.
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// A retrieved [`Segment`] paired with its distance to the query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedSegment {
    /// The retrieved segment.
    pub segment: Segment,
    /// Distance to the query vector (lower is more relevant).
    pub distance: f32,
}

/// Segments ordered by ascending distance, most relevant first.
pub type RetrievalResult = Vec<RetrievedSegment>;

/// A cited source returned alongside an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    /// The segment text used as context.
    pub text: String,
    /// Distance of the segment to the query.
    pub distance: f32,
    /// Where the segment came from (file name, URI), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl From<&RetrievedSegment> for Source {
    fn from(hit: &RetrievedSegment) -> Self {
        Self {
            text: hit.segment.text.clone(),
            distance: hit.distance,
            origin: hit.segment.source.clone(),
        }
    }
}

/// A grounded answer with the sources it was generated from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    /// Text returned by the generation model (or the fixed empty-index answer).
    pub answer: String,
    /// Retrieved segments in retrieval order.
    pub sources: Vec<Source>,
}
