//! Query-time retrieval against a previously built index.

use crate::storage::{ChunkStore, EmbeddingStore, IndexMetadata, SqliteStore};
use anyhow::{Result, anyhow, bail};
use lectern_embed::EmbeddingProvider;
use serde::Serialize;
use std::sync::Arc;

/// Default number of results returned by [`Retriever::search`].
pub const DEFAULT_TOP_K: usize = 5;

/// A retrieved chunk paired with its similarity score.
///
/// Ordering by descending `score` defines relevance rank; over unit
/// vectors the score is cosine similarity, so it tops out near 1.0.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub score: f32,
    pub text: String,
}

/// Answers similarity queries against a built index.
///
/// Opening a retriever fails fast when the store was never built, when its
/// row count disagrees with the recorded metadata, or when the injected
/// provider embeds into a different space than the index was built with.
pub struct Retriever {
    store: SqliteStore,
    provider: Arc<dyn EmbeddingProvider>,
    metadata: IndexMetadata,
}

impl Retriever {
    /// Open a retriever over `store`, validating it against `provider`.
    pub async fn open(store: SqliteStore, provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let metadata = store
            .get_metadata()
            .await?
            .ok_or_else(|| anyhow!("no index metadata found: has the index been built?"))?;

        let stored = store.chunk_count().await?;
        if stored != metadata.chunk_count {
            bail!(
                "index is inconsistent: metadata records {} chunks but {} are stored",
                metadata.chunk_count,
                stored
            );
        }

        if provider.embedding_dimension() != metadata.dimension {
            bail!(
                "embedding model mismatch: index was built with {}-dimensional vectors \
                 but the provider produces {}-dimensional ones",
                metadata.dimension,
                provider.embedding_dimension()
            );
        }

        tracing::debug!(
            "Opened index: {} chunks, model {}",
            metadata.chunk_count,
            metadata.model_id()
        );

        Ok(Self {
            store,
            provider,
            metadata,
        })
    }

    /// Metadata recorded when the index was built.
    pub fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }

    /// Return the `top_k` chunks most similar to `query`, best first.
    ///
    /// A `top_k` larger than the index yields fewer results rather than an
    /// error.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        tracing::debug!("Searching for: '{}' (top_k={})", query, top_k);

        let embedded = self.provider.embed_texts(&[query.to_string()]).await?;
        let query_vec = embedded
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("embedding provider returned no vector for the query"))?;

        let hits = self.store.search_similar(&query_vec, top_k).await?;

        let mut results = Vec::with_capacity(hits.len());
        for (position, score) in hits {
            let chunk = self
                .store
                .get_chunk(position)
                .await?
                .ok_or_else(|| anyhow!("chunk at position {position} missing from store"))?;
            results.push(SearchResult {
                score,
                text: chunk.content,
            });
        }

        Ok(results)
    }
}
