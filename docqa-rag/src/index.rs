//! Nearest-neighbor vector index.
//!
//! [`VectorIndex`] is the seam for swapping search structures; [`FlatIndex`]
//! is the exact brute-force implementation, which is fast enough for the
//! segments of a single document. [`SegmentIndex`] pairs an index with the
//! segments its vectors were computed from.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::{RetrievalResult, RetrievedSegment, Segment};
use crate::error::{RagError, Result};

/// Distance metric used to rank vectors. Lower is closer for every metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Euclidean (L2) distance.
    #[default]
    Euclidean,
    /// Cosine distance, `1 - cosine_similarity`.
    Cosine,
}

impl DistanceMetric {
    /// Distance between two vectors of equal length.
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Euclidean => euclidean(a, b),
            DistanceMetric::Cosine => 1.0 - cosine_similarity(a, b),
        }
    }
}

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
}

/// Cosine similarity; 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// A search hit: the position of a stored vector and its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Insertion position of the vector (0-based).
    pub position: usize,
    /// Distance to the query under the index metric.
    pub distance: f32,
}

/// Ascending distance, then ascending position.
fn rank(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance.total_cmp(&b.distance).then(a.position.cmp(&b.position))
}

/// A store of equal-length vectors answering k-nearest-neighbor queries.
///
/// Positions are assigned in insertion order and stay stable for the
/// lifetime of the index. Searches never mutate the index.
pub trait VectorIndex: Send + Sync + fmt::Debug {
    /// The metric used to rank results.
    fn metric(&self) -> DistanceMetric;

    /// Vector dimensionality, or `None` until it has been fixed.
    fn dimensions(&self) -> Option<usize>;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    /// Whether the index holds no vectors.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The vector stored at `position`.
    fn vector(&self, position: usize) -> Option<&[f32]>;

    /// Append vectors in order.
    ///
    /// Either all vectors are added or none are.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if any vector's length differs
    /// from the index dimensionality.
    fn add(&mut self, vectors: Vec<Vec<f32>>) -> Result<()>;

    /// Return up to `k` nearest vectors ordered by ascending distance, ties
    /// broken by lower position.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyIndex`] if no vectors were added and
    /// [`RagError::DimensionMismatch`] if `query` has the wrong length.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;
}

/// Exact brute-force index over contiguously stored vectors.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{DistanceMetric, FlatIndex, VectorIndex};
///
/// let mut index = FlatIndex::new(DistanceMetric::Euclidean);
/// index.add(vec![vec![0.0, 1.0], vec![1.0, 0.0]])?;
/// let hits = index.search(&[0.0, 0.9], 1)?;
/// assert_eq!(hits[0].position, 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FlatIndex {
    metric: DistanceMetric,
    dimensions: Option<usize>,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Create an empty index whose dimensionality is fixed by the first add.
    pub fn new(metric: DistanceMetric) -> Self {
        Self { metric, dimensions: None, data: Vec::new() }
    }

    /// Create an empty index with a fixed dimensionality.
    pub fn with_dimensions(metric: DistanceMetric, dimensions: usize) -> Self {
        Self { metric, dimensions: Some(dimensions), data: Vec::new() }
    }
}

impl VectorIndex for FlatIndex {
    fn metric(&self) -> DistanceMetric {
        self.metric
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    fn len(&self) -> usize {
        match self.dimensions {
            Some(d) if d > 0 => self.data.len() / d,
            _ => 0,
        }
    }

    fn vector(&self, position: usize) -> Option<&[f32]> {
        let d = self.dimensions?;
        self.data.get(position * d..(position + 1) * d)
    }

    fn add(&mut self, vectors: Vec<Vec<f32>>) -> Result<()> {
        let Some(first) = vectors.first() else {
            return Ok(());
        };
        let expected = self.dimensions.unwrap_or(first.len());
        if expected == 0 {
            return Err(RagError::Config("vectors must have at least one dimension".into()));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return Err(RagError::DimensionMismatch { expected, actual: bad.len() });
        }

        self.dimensions = Some(expected);
        self.data.reserve(vectors.len() * expected);
        for vector in vectors {
            self.data.extend(vector);
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        let dimensions = match self.dimensions {
            Some(d) if !self.data.is_empty() => d,
            _ => return Err(RagError::EmptyIndex),
        };
        if query.len() != dimensions {
            return Err(RagError::DimensionMismatch { expected: dimensions, actual: query.len() });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut neighbors: Vec<Neighbor> = self
            .data
            .chunks_exact(dimensions)
            .enumerate()
            .map(|(position, stored)| Neighbor {
                position,
                distance: self.metric.distance(stored, query),
            })
            .collect();

        if k < neighbors.len() {
            neighbors.select_nth_unstable_by(k - 1, rank);
            neighbors.truncate(k);
        }
        neighbors.sort_unstable_by(rank);
        Ok(neighbors)
    }
}

/// A vector index paired with the segments its vectors represent.
///
/// Position `i` in the index corresponds to `segments()[i]`.
#[derive(Debug)]
pub struct SegmentIndex {
    index: Box<dyn VectorIndex>,
    segments: Vec<Segment>,
}

impl SegmentIndex {
    /// Create an empty exact index with the given metric.
    pub fn new(metric: DistanceMetric) -> Self {
        Self { index: Box::new(FlatIndex::new(metric)), segments: Vec::new() }
    }

    /// Wrap an empty vector index.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `index` already holds vectors, since
    /// they would have no segments to map to.
    pub fn with_index(index: Box<dyn VectorIndex>) -> Result<Self> {
        if !index.is_empty() {
            return Err(RagError::Config(format!(
                "segment index must start empty, got {} vector(s)",
                index.len()
            )));
        }
        Ok(Self { index, segments: Vec::new() })
    }

    /// Append segments with their vectors.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if the counts differ, or the error from
    /// [`VectorIndex::add`].
    pub fn add(&mut self, segments: Vec<Segment>, vectors: Vec<Vec<f32>>) -> Result<()> {
        if segments.len() != vectors.len() {
            return Err(RagError::Config(format!(
                "{} segment(s) but {} vector(s)",
                segments.len(),
                vectors.len()
            )));
        }
        self.index.add(vectors)?;
        self.segments.extend(segments);
        Ok(())
    }

    /// Return up to `k` segments nearest to `query`, most relevant first.
    ///
    /// # Errors
    ///
    /// Same as [`VectorIndex::search`].
    pub fn search(&self, query: &[f32], k: usize) -> Result<RetrievalResult> {
        let neighbors = self.index.search(query, k)?;
        Ok(neighbors
            .into_iter()
            .filter_map(|n| {
                let segment = self.segments.get(n.position)?.clone();
                Some(RetrievedSegment { segment, distance: n.distance })
            })
            .collect())
    }

    /// Number of indexed segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether nothing has been indexed.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Indexed segments in position order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The underlying vector index.
    pub fn vectors(&self) -> &dyn VectorIndex {
        self.index.as_ref()
    }
}

impl Default for SegmentIndex {
    fn default() -> Self {
        Self::new(DistanceMetric::default())
    }
}
