//! Configuration for embedding models

use serde::{Deserialize, Serialize};

/// Name of the built-in model the provider loads.
pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Configuration for embedding models.
///
/// The model identifier is fixed per index: changing it requires rebuilding
/// the index from scratch, since embedding spaces are not cross-compatible.
/// The config serializes deterministically, which is what the provider's
/// process-wide model cache keys on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedConfig {
    /// Name of the embedding model to use
    pub model_name: String,
    /// Maximum batch size for embedding generation
    pub batch_size: usize,
    /// Whether to normalize embeddings to unit length
    pub normalize: bool,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            batch_size: 16,
            normalize: true,
        }
    }
}

impl EmbedConfig {
    /// Create a configuration for a named model with default batching.
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            ..Self::default()
        }
    }

    /// Set the maximum batch size for embedding generation.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set whether embeddings are normalized to unit length.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Name of the configured model.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}
