//! JSON snapshots of a built [`SegmentIndex`].
//!
//! A snapshot stores segments and their vectors side by side so an index can
//! be restored without calling the embedding provider again.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::document::Segment;
use crate::error::{RagError, Result};
use crate::index::{DistanceMetric, FlatIndex, SegmentIndex};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable contents of a [`SegmentIndex`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexSnapshot {
    /// Format version, checked on load.
    pub version: u32,
    /// Metric the index was built with.
    pub metric: DistanceMetric,
    /// Vector dimensionality, absent for an empty index.
    pub dimensions: Option<usize>,
    /// Segments in position order.
    pub segments: Vec<Segment>,
    /// Vectors in position order, parallel to `segments`.
    pub vectors: Vec<Vec<f32>>,
}

impl IndexSnapshot {
    /// Capture the contents of `index`.
    pub fn capture(index: &SegmentIndex) -> Self {
        let vectors = index.vectors();
        Self {
            version: SNAPSHOT_VERSION,
            metric: vectors.metric(),
            dimensions: vectors.dimensions(),
            segments: index.segments().to_vec(),
            vectors: (0..vectors.len())
                .filter_map(|position| vectors.vector(position).map(<[f32]>::to_vec))
                .collect(),
        }
    }

    /// Rebuild an exact index from the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Snapshot`] on a version mismatch or when segments
    /// and vectors disagree, and [`RagError::DimensionMismatch`] if a vector
    /// does not match the recorded dimensionality.
    pub fn restore(self) -> Result<SegmentIndex> {
        if self.version != SNAPSHOT_VERSION {
            return Err(RagError::Snapshot(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                self.version
            )));
        }
        if self.segments.len() != self.vectors.len() {
            return Err(RagError::Snapshot(format!(
                "{} segment(s) but {} vector(s)",
                self.segments.len(),
                self.vectors.len()
            )));
        }

        let flat = match self.dimensions {
            Some(d) => FlatIndex::with_dimensions(self.metric, d),
            None => FlatIndex::new(self.metric),
        };
        let mut index = SegmentIndex::with_index(Box::new(flat))?;
        index.add(self.segments, self.vectors)?;
        Ok(index)
    }

    /// Write the snapshot as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_vec(self)
            .map_err(|e| RagError::Snapshot(format!("failed to serialize snapshot: {e}")))?;
        fs::write(path, json)?;
        info!(path = %path.display(), segment_count = self.segments.len(), "saved index snapshot");
        Ok(())
    }

    /// Read a snapshot written by [`save`](IndexSnapshot::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            RagError::Snapshot(format!("malformed snapshot '{}': {e}", path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> SegmentIndex {
        let segments = (0..3)
            .map(|i| Segment {
                document_id: "doc".into(),
                sequence: i,
                start: i * 5,
                end: i * 5 + 5,
                text: format!("part{i}"),
                source: Some("parts.txt".into()),
            })
            .collect();
        let mut index = SegmentIndex::new(DistanceMetric::Euclidean);
        index.add(segments, vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![4.0, 4.0]]).unwrap();
        index
    }

    #[test]
    fn file_round_trip_preserves_search() {
        let index = sample_index();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        IndexSnapshot::capture(&index).save(&path).unwrap();
        let restored = IndexSnapshot::load(&path).unwrap().restore().unwrap();

        assert_eq!(restored.segments(), index.segments());
        assert_eq!(
            restored.search(&[0.9, 0.9], 3).unwrap(),
            index.search(&[0.9, 0.9], 3).unwrap()
        );
    }

    #[test]
    fn empty_index_restores_empty() {
        let snapshot = IndexSnapshot::capture(&SegmentIndex::default());
        assert_eq!(snapshot.dimensions, None);
        assert!(snapshot.restore().unwrap().is_empty());
    }

    #[test]
    fn segments_without_source_field_still_load() {
        let json = r#"{"document_id":"doc","sequence":0,"start":0,"end":4,"text":"part"}"#;
        let segment: Segment = serde_json::from_str(json).unwrap();
        assert_eq!(segment.source, None);
    }

    #[test]
    fn rejects_unknown_version() {
        let mut snapshot = IndexSnapshot::capture(&sample_index());
        snapshot.version = 99;
        assert!(matches!(snapshot.restore(), Err(RagError::Snapshot(_))));
    }

    #[test]
    fn rejects_parallel_length_mismatch() {
        let mut snapshot = IndexSnapshot::capture(&sample_index());
        snapshot.vectors.pop();
        assert!(matches!(snapshot.restore(), Err(RagError::Snapshot(_))));
    }

    #[test]
    fn rejects_vector_of_wrong_dimension() {
        let mut snapshot = IndexSnapshot::capture(&sample_index());
        snapshot.vectors[1] = vec![1.0];
        assert!(matches!(snapshot.restore(), Err(RagError::DimensionMismatch { .. })));
    }

    #[test]
    fn malformed_file_is_snapshot_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(IndexSnapshot::load(&path), Err(RagError::Snapshot(_))));
    }
}
