//! Configuration for chunking and retrieval.

use std::time::Duration;

use citekit_core::{CitekitError, Result};
use serde::{Deserialize, Serialize};

/// Configuration parameters for the retrieval side of the library.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    /// Target passage size in bytes.
    pub chunk_size: usize,
    /// Overlap between consecutive passages of an oversized section, in bytes.
    pub chunk_overlap: usize,
    /// Number of passages returned from a retrieval plan.
    pub top_k: usize,
    /// Minimum normalized similarity for retrieved passages. Passages
    /// scoring below the floor are dropped, even if fewer than `top_k`
    /// remain.
    pub relevance_floor: f32,
    /// Candidate multiplier applied before overlap dedup and the floor:
    /// the index is asked for `top_k * overfetch_factor` hits.
    pub overfetch_factor: usize,
    /// Deadline for a single external embedding call.
    pub request_timeout: Duration,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 120,
            top_k: 8,
            relevance_floor: 0.0,
            overfetch_factor: 3,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl RetrievalConfig {
    /// Create a new builder for constructing a [`RetrievalConfig`].
    pub fn builder() -> RetrievalConfigBuilder {
        RetrievalConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RetrievalConfig`].
#[derive(Debug, Clone, Default)]
pub struct RetrievalConfigBuilder {
    config: RetrievalConfig,
}

impl RetrievalConfigBuilder {
    /// Set the target passage size in bytes.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive passages in bytes.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of passages returned from a retrieval plan.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum normalized similarity for retrieved passages.
    pub fn relevance_floor(mut self, floor: f32) -> Self {
        self.config.relevance_floor = floor;
        self
    }

    /// Set the candidate multiplier used before dedup and the floor.
    pub fn overfetch_factor(mut self, factor: usize) -> Self {
        self.config.overfetch_factor = factor;
        self
    }

    /// Set the deadline for a single external embedding call.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Build the [`RetrievalConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`CitekitError::Config`] if:
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `relevance_floor` is outside `[0, 1]`
    /// - `overfetch_factor == 0`
    /// - `request_timeout` is zero
    pub fn build(self) -> Result<RetrievalConfig> {
        if self.config.chunk_overlap >= self.config.chunk_size {
            return Err(CitekitError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.config.chunk_overlap, self.config.chunk_size
            )));
        }
        if self.config.top_k == 0 {
            return Err(CitekitError::Config("top_k must be greater than zero".to_string()));
        }
        if !(0.0..=1.0).contains(&self.config.relevance_floor) {
            return Err(CitekitError::Config(format!(
                "relevance_floor ({}) must be in [0, 1]",
                self.config.relevance_floor
            )));
        }
        if self.config.overfetch_factor == 0 {
            return Err(CitekitError::Config(
                "overfetch_factor must be greater than zero".to_string(),
            ));
        }
        if self.config.request_timeout.is_zero() {
            return Err(CitekitError::Config("request_timeout must be non-zero".to_string()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_validation() {
        let config = RetrievalConfig::builder().build().unwrap();
        assert_eq!(config, RetrievalConfig::default());
    }

    #[test]
    fn overlap_must_stay_below_chunk_size() {
        let err = RetrievalConfig::builder().chunk_size(100).chunk_overlap(100).build().unwrap_err();
        assert!(matches!(err, CitekitError::Config(_)));
    }

    #[test]
    fn floor_outside_unit_interval_is_rejected() {
        let err = RetrievalConfig::builder().relevance_floor(1.2).build().unwrap_err();
        assert!(matches!(err, CitekitError::Config(_)));
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let err = RetrievalConfig::builder().top_k(0).build().unwrap_err();
        assert!(matches!(err, CitekitError::Config(_)));
    }
}
