//! Retrieval settings shared by indexing and querying.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
pub const DEFAULT_TOP_K: usize = 3;

/// Lowest possible cosine similarity; as a threshold it filters nothing.
pub const NO_THRESHOLD: f32 = -1.0;

/// Chunking and retrieval parameters.
///
/// `chunk_size` and `chunk_overlap` are counted in characters and feed the
/// index fingerprint, so changing either one forces a rebuild.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    pub chunk_size: usize,
    /// Always smaller than `chunk_size`.
    pub chunk_overlap: usize,
    /// Chunks placed into the prompt per question.
    pub top_k: usize,
    /// Retrieved chunks scoring below this are dropped before prompting.
    pub similarity_threshold: f32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            similarity_threshold: NO_THRESHOLD,
        }
    }
}

impl RagConfig {
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Starts from [`RagConfig::default`]; [`build`](Self::build) validates.
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// # Errors
    ///
    /// [`RagError::ConfigError`] when `chunk_size` or `top_k` is zero, or the
    /// overlap is not smaller than the chunk size.
    pub fn build(self) -> Result<RagConfig> {
        let RagConfig { chunk_size, chunk_overlap, top_k, .. } = self.config;
        if chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        if top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_settings() {
        let config = RagConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.top_k, 3);
        assert!(RagConfig::builder().build().is_ok());
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        let err = RagConfig::builder().chunk_size(100).chunk_overlap(100).build().unwrap_err();
        assert!(matches!(err, RagError::ConfigError(_)));
    }

    #[test]
    fn rejects_zero_top_k() {
        assert!(RagConfig::builder().top_k(0).build().is_err());
    }
}
