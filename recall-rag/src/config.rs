//! Configuration for chunking and retrieval.

use serde::{Deserialize, Serialize};

use crate::error::{RecallError, Result};

/// Default embedding model name.
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

/// Configuration parameters for ingestion and search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecallConfig {
    /// Words per chunk window.
    pub chunk_size: usize,
    /// Words shared between consecutive chunk windows.
    pub chunk_overlap: usize,
    /// Number of top results to return from a search.
    pub top_k: usize,
    /// Minimum similarity score for results; `None` returns everything
    /// `top_k` asks for, however weak the match.
    pub score_floor: Option<f32>,
    /// Name of the sentence-embedding model.
    pub model: String,
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            top_k: 5,
            score_floor: None,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl RecallConfig {
    /// Create a new builder for constructing a [`RecallConfig`].
    pub fn builder() -> RecallConfigBuilder {
        RecallConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RecallConfig`].
#[derive(Debug, Clone, Default)]
pub struct RecallConfigBuilder {
    config: RecallConfig,
}

impl RecallConfigBuilder {
    /// Set the chunk window size in words.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunk windows in words.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of top results to return from a search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set a minimum similarity score; results scoring below it are dropped.
    pub fn score_floor(mut self, floor: f32) -> Self {
        self.config.score_floor = Some(floor);
        self
    }

    /// Set the sentence-embedding model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Build the [`RecallConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RecallError::Config`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size` (the window step would be non-positive)
    /// - `top_k == 0`
    /// - `score_floor` is outside `[-1, 1]` or not a number
    pub fn build(self) -> Result<RecallConfig> {
        if self.config.chunk_size == 0 {
            return Err(RecallError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.config.chunk_overlap >= self.config.chunk_size {
            return Err(RecallError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.config.chunk_overlap, self.config.chunk_size
            )));
        }
        if self.config.top_k == 0 {
            return Err(RecallError::Config("top_k must be greater than zero".to_string()));
        }
        if let Some(floor) = self.config.score_floor {
            if !(-1.0..=1.0).contains(&floor) {
                return Err(RecallError::Config(format!(
                    "score_floor ({floor}) must be within [-1, 1]"
                )));
            }
        }
        Ok(self.config)
    }
}
