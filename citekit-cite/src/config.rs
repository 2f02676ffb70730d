//! Configuration for the citation linker.

use citekit_core::{CitekitError, Result};
use serde::{Deserialize, Serialize};

/// Configuration parameters for [`CitationLinker`](crate::CitationLinker).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkerConfig {
    /// Fallback context window radius in bytes, used when no enclosing
    /// sentence can be found around a marker.
    pub context_radius: usize,
    /// Minimum author-year match score for linking a citation to a
    /// bibliography entry. Scores range over `[0, 1]`.
    pub resolution_threshold: f32,
    /// Maximum number of bibliography entries parsed per paper.
    pub max_references: usize,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self { context_radius: 200, resolution_threshold: 0.7, max_references: 100 }
    }
}

impl LinkerConfig {
    /// Create a new builder for constructing a [`LinkerConfig`].
    pub fn builder() -> LinkerConfigBuilder {
        LinkerConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`LinkerConfig`].
#[derive(Debug, Clone, Default)]
pub struct LinkerConfigBuilder {
    config: LinkerConfig,
}

impl LinkerConfigBuilder {
    /// Set the fallback context window radius in bytes.
    pub fn context_radius(mut self, radius: usize) -> Self {
        self.config.context_radius = radius;
        self
    }

    /// Set the minimum author-year resolution score.
    pub fn resolution_threshold(mut self, threshold: f32) -> Self {
        self.config.resolution_threshold = threshold;
        self
    }

    /// Set the maximum number of bibliography entries parsed per paper.
    pub fn max_references(mut self, max: usize) -> Self {
        self.config.max_references = max;
        self
    }

    /// Build the [`LinkerConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`CitekitError::Config`] if:
    /// - `context_radius == 0`
    /// - `resolution_threshold` is outside `(0, 1]`
    /// - `max_references == 0`
    pub fn build(self) -> Result<LinkerConfig> {
        if self.config.context_radius == 0 {
            return Err(CitekitError::Config("context_radius must be greater than zero".to_string()));
        }
        if !(self.config.resolution_threshold > 0.0 && self.config.resolution_threshold <= 1.0) {
            return Err(CitekitError::Config(format!(
                "resolution_threshold ({}) must be in (0, 1]",
                self.config.resolution_threshold
            )));
        }
        if self.config.max_references == 0 {
            return Err(CitekitError::Config("max_references must be greater than zero".to_string()));
        }
        Ok(self.config)
    }
}
