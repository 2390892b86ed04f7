//! Index construction: chunks in, persisted searchable index out.

use crate::storage::{ChunkStore, IndexMetadata, IndexedChunk, SqliteStore};
use anyhow::{Result, bail};
use lectern_embed::EmbeddingProvider;
use tracing::info;

/// Builds a queryable index from an ordered chunk sequence.
///
/// The builder embeds all chunks in one batch call, then writes chunk text
/// and vectors into the store in input order, so slot `i` always corresponds
/// to the `i`-th input chunk. Any existing index in the store is overwritten
/// without confirmation.
pub struct IndexBuilder<'a> {
    store: &'a SqliteStore,
    provider: &'a dyn EmbeddingProvider,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(store: &'a SqliteStore, provider: &'a dyn EmbeddingProvider) -> Self {
        Self { store, provider }
    }

    /// Embed and persist `chunks`, returning how many were indexed.
    ///
    /// Fails on an empty chunk sequence (the embedding dimension cannot be
    /// inferred, and an empty index is never useful), and propagates
    /// provider and storage failures unwrapped.
    pub async fn build(&self, chunks: &[String]) -> Result<usize> {
        if chunks.is_empty() {
            bail!("cannot build an index from an empty chunk sequence: embedding dimension cannot be inferred");
        }

        let result = self.provider.embed_texts(chunks).await?;
        if result.len() != chunks.len() {
            bail!(
                "embedding provider returned {} vectors for {} chunks",
                result.len(),
                chunks.len()
            );
        }
        let dimension = result.dimension;
        if dimension == 0 {
            bail!("embedding provider returned zero-dimensional vectors");
        }

        let rows: Vec<IndexedChunk> = chunks
            .iter()
            .zip(result.embeddings)
            .enumerate()
            .map(|(position, (content, embedding))| IndexedChunk {
                position: position as i64,
                content: content.clone(),
                embedding,
            })
            .collect();

        // Overwrite semantics: a rebuild replaces the previous index wholesale.
        self.store.clear().await?;
        self.store.insert_chunks(&rows).await?;

        let metadata = IndexMetadata::new(
            self.provider.model_name().to_string(),
            self.provider.provider_name().to_string(),
            dimension,
        )
        .with_normalized(true)
        .with_chunk_count(chunks.len());
        self.store.upsert_metadata(&metadata).await?;

        info!(
            "Indexed {} chunks ({}-dimensional embeddings, model {})",
            chunks.len(),
            dimension,
            metadata.model_name
        );

        Ok(chunks.len())
    }
}
