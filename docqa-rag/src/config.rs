//! Configuration for the document QA pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::index::DistanceMetric;

/// Configuration parameters for chunking, retrieval, and upstream calls.
///
/// Deserializes from partial JSON: missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Target maximum segment length in characters.
    pub chunk_size: usize,
    /// Number of trailing characters repeated at the start of the next segment.
    pub chunk_overlap: usize,
    /// Segments shorter than this after trimming whitespace are dropped.
    pub min_segment_length: usize,
    /// Number of segments retrieved when the caller does not specify `k`.
    pub top_k: usize,
    /// Distance metric used by the vector index.
    pub metric: DistanceMetric,
    /// Number of segments sent to the embedding provider per call.
    pub embedding_batch_size: usize,
    /// Deadline for a single embedding call, in milliseconds. `None` disables it.
    pub embedding_timeout_ms: Option<u64>,
    /// Deadline for a single generation call, in milliseconds. `None` disables it.
    pub generation_timeout_ms: Option<u64>,
    /// Optional system instruction sent ahead of the grounded prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            min_segment_length: 50,
            top_k: 4,
            metric: DistanceMetric::Euclidean,
            embedding_batch_size: 64,
            embedding_timeout_ms: Some(30_000),
            generation_timeout_ms: Some(60_000),
            system_prompt: None,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Deadline applied to embedding calls.
    pub fn embedding_timeout(&self) -> Option<Duration> {
        self.embedding_timeout_ms.map(Duration::from_millis)
    }

    /// Deadline applied to generation calls.
    pub fn generation_timeout(&self) -> Option<Duration> {
        self.generation_timeout_ms.map(Duration::from_millis)
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `embedding_batch_size == 0`
    /// - a timeout of zero milliseconds
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if self.embedding_batch_size == 0 {
            return Err(RagError::Config(
                "embedding_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.embedding_timeout_ms == Some(0) || self.generation_timeout_ms == Some(0) {
            return Err(RagError::Config(
                "timeouts must be positive; use null to disable them".to_string(),
            ));
        }
        Ok(())
    }
}

fn millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum segment length in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive segments in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the noise threshold below which segments are dropped.
    pub fn min_segment_length(mut self, length: usize) -> Self {
        self.config.min_segment_length = length;
        self
    }

    /// Set the default number of segments to retrieve.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the index distance metric.
    pub fn metric(mut self, metric: DistanceMetric) -> Self {
        self.config.metric = metric;
        self
    }

    /// Set how many segments are embedded per provider call.
    pub fn embedding_batch_size(mut self, size: usize) -> Self {
        self.config.embedding_batch_size = size;
        self
    }

    /// Set the embedding deadline. `None` waits indefinitely.
    pub fn embedding_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.embedding_timeout_ms = timeout.map(millis);
        self
    }

    /// Set the generation deadline. `None` waits indefinitely.
    pub fn generation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.generation_timeout_ms = timeout.map(millis);
        self
    }

    /// Set a system instruction for the generation model.
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.metric, DistanceMetric::Euclidean);
        assert_eq!(config.embedding_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn rejects_overlap_not_below_chunk_size() {
        let result = RagConfig::builder().chunk_size(100).chunk_overlap(100).build();
        assert!(matches!(result, Err(RagError::Config(_))));
    }

    #[test]
    fn rejects_zero_sizes() {
        assert!(RagConfig::builder().chunk_size(0).chunk_overlap(0).build().is_err());
        assert!(RagConfig::builder().top_k(0).build().is_err());
        assert!(RagConfig::builder().embedding_batch_size(0).build().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: RagConfig =
            serde_json::from_str(r#"{"chunk_size": 400, "chunk_overlap": 40, "metric": "cosine"}"#)
                .unwrap();
        assert_eq!(config.chunk_size, 400);
        assert_eq!(config.chunk_overlap, 40);
        assert_eq!(config.metric, DistanceMetric::Cosine);
        assert_eq!(config.min_segment_length, 50);
        assert!(config.system_prompt.is_none());
    }

    #[test]
    fn timeouts_can_be_disabled() {
        let config = RagConfig::builder().generation_timeout(None).build().unwrap();
        assert_eq!(config.generation_timeout(), None);
    }

    #[test]
    fn sub_second_timeouts_keep_their_precision() {
        let config = RagConfig::builder()
            .embedding_timeout(Some(Duration::from_millis(1500)))
            .generation_timeout(Some(Duration::from_millis(500)))
            .build()
            .unwrap();
        assert_eq!(config.embedding_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.generation_timeout(), Some(Duration::from_millis(500)));

        let json = serde_json::to_string(&config).unwrap();
        let parsed: RagConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.generation_timeout(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn rejects_zero_timeouts() {
        let zero = RagConfig::builder().embedding_timeout(Some(Duration::ZERO)).build();
        assert!(matches!(zero, Err(RagError::Config(_))));
        let below_a_millisecond =
            RagConfig::builder().generation_timeout(Some(Duration::from_micros(200))).build();
        assert!(matches!(below_a_millisecond, Err(RagError::Config(_))));
    }
}
