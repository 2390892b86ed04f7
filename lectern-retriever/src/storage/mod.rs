//! Storage abstraction layer for lectern-retriever
//!
//! This module provides trait-based abstractions for storing and retrieving
//! document chunks and their embeddings. Chunk text and vectors live in a
//! SINGLE database so they can never be persisted or loaded independently of
//! each other: the slot-to-text mapping is a table row, not a convention
//! between two files.
//!
//! ## Key Components
//!
//! - **ChunkStore**: positional text storage and retrieval operations
//! - **EmbeddingStore**: vector similarity search operations
//! - **IndexMetadata**: model/dimension/count record cross-checked on load
//! - **SqliteStore**: the concrete implementation
//!
//! ## Invariant
//!
//! Row `position = i` holds exactly the `i`-th chunk of the ingested
//! document together with its embedding. The index builder writes rows in
//! chunk order and records the count in [`IndexMetadata`]; the retriever
//! refuses to open a store whose row count disagrees.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod sqlite_store;

pub use sqlite_store::SqliteStore;

/// Zero-based slot of a chunk within the index.
pub type ChunkPosition = i64;

/// A document chunk stored alongside its embedding vector.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedChunk {
    /// Slot of this chunk in the original chunk sequence
    pub position: ChunkPosition,
    /// The chunk text, persisted verbatim
    pub content: String,
    /// Unit-normalized embedding vector (f16 for efficiency)
    pub embedding: Vec<half::f16>,
}

/// Metadata about the embedding model and shape of a built index.
///
/// Written once at build time and cross-checked when the index is opened
/// for querying, so a store built with one model cannot silently serve
/// queries embedded with another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Name of the embedding model (e.g., "all-MiniLM-L6-v2")
    pub model_name: String,
    /// Provider of the embedding model (e.g., "fastembed")
    pub provider: String,
    /// Dimension of the embedding vectors
    pub dimension: usize,
    /// Whether embeddings are normalized to unit length
    pub normalized: bool,
    /// Number of chunks the index was built with
    pub chunk_count: usize,
    /// Unix timestamp of the build
    pub created_at: i64,
}

impl IndexMetadata {
    pub fn new(model_name: String, provider: String, dimension: usize) -> Self {
        Self {
            model_name,
            provider,
            dimension,
            normalized: false,
            chunk_count: 0,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn with_normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    pub fn with_chunk_count(mut self, chunk_count: usize) -> Self {
        self.chunk_count = chunk_count;
        self
    }

    /// Create a unique identifier for this model configuration
    pub fn model_id(&self) -> String {
        let normalized_part = if self.normalized { "norm" } else { "raw" };
        format!(
            "{}:{}:{}:{}",
            self.provider, self.model_name, self.dimension, normalized_part
        )
    }
}

/// Positional text storage operations for document chunks.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Insert chunks, replacing any existing rows at the same positions
    async fn insert_chunks(&self, chunks: &[IndexedChunk]) -> Result<()>;

    /// Get the chunk at a specific position
    async fn get_chunk(&self, position: ChunkPosition) -> Result<Option<IndexedChunk>>;

    /// Get all chunks in position order
    async fn all_chunks(&self) -> Result<Vec<IndexedChunk>>;

    /// Number of stored chunks
    async fn chunk_count(&self) -> Result<usize>;

    /// Delete all chunks
    async fn clear(&self) -> Result<()>;
}

/// Vector similarity search operations.
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    /// Search for the `top_k` chunks most similar to `query` by inner
    /// product, in descending score order. Returns fewer results when the
    /// index holds fewer than `top_k` chunks.
    async fn search_similar(
        &self,
        query: &[half::f16],
        top_k: usize,
    ) -> Result<Vec<(ChunkPosition, f32)>>;
}
