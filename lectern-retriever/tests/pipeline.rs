//! Integration tests for the build-and-retrieve pipeline.
//!
//! These run against a deterministic stub embedding provider so they cover
//! the orchestration, storage, and ranking logic without downloading a
//! model: identical texts embed to identical vectors, so self-retrieval
//! must rank the queried chunk first with a score at the similarity ceiling.

use anyhow::Result;
use async_trait::async_trait;
use half::f16;
use lectern_context::text::TextChunker;
use lectern_embed::{EmbeddingProvider, EmbeddingResult};
use lectern_retriever::builder::IndexBuilder;
use lectern_retriever::prompt::build_prompt;
use lectern_retriever::retriever::Retriever;
use lectern_retriever::storage::{ChunkStore, SqliteStore};
use std::sync::Arc;
use tempfile::tempdir;

/// Deterministic embedding provider: hashed byte histogram, unit-normalized.
struct StubEmbeddingProvider {
    dimension: usize,
}

impl StubEmbeddingProvider {
    fn new() -> Self {
        Self { dimension: 8 }
    }

    fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed(&self, text: &str) -> Vec<f16> {
        let mut buckets = vec![0.0f32; self.dimension];
        for (i, byte) in text.bytes().enumerate() {
            let mixed = (byte as u32)
                .wrapping_mul(2654435761)
                .wrapping_add(i as u32)
                .wrapping_mul(40503);
            buckets[(mixed as usize) % self.dimension] += 1.0;
        }
        let norm = buckets.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut buckets {
                *value /= norm;
            }
        }
        buckets.into_iter().map(f16::from_f32).collect()
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbeddingProvider {
    async fn embed_text(&self, text: &str) -> lectern_embed::Result<Vec<f16>> {
        Ok(self.embed(text))
    }

    async fn embed_texts(&self, texts: &[String]) -> lectern_embed::Result<EmbeddingResult> {
        Ok(EmbeddingResult::new(
            texts.iter().map(|t| self.embed(t)).collect(),
        ))
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "stub-histogram"
    }

    fn provider_name(&self) -> &str {
        "stub"
    }
}

fn sample_chunks() -> Vec<String> {
    vec![
        "The mitochondria is the powerhouse of the cell.".to_string(),
        "Rust's borrow checker enforces memory safety at compile time.".to_string(),
        "The Treaty of Westphalia ended the Thirty Years' War in 1648.".to_string(),
    ]
}

#[tokio::test]
async fn test_build_and_self_retrieval() -> Result<()> {
    let store = SqliteStore::open_memory().await?;
    let provider = StubEmbeddingProvider::new();
    let chunks = sample_chunks();

    let count = IndexBuilder::new(&store, &provider).build(&chunks).await?;
    assert_eq!(count, chunks.len());

    let retriever = Retriever::open(store, Arc::new(StubEmbeddingProvider::new())).await?;

    // A query identical to an indexed chunk comes back at rank 1 with a
    // score at the ceiling for normalized inner-product search.
    let results = retriever.search(&chunks[1], 1).await?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].text, chunks[1]);
    assert!(
        results[0].score > 0.98,
        "self-retrieval score should be near 1.0, got {}",
        results[0].score
    );

    Ok(())
}

#[tokio::test]
async fn test_search_ordering_and_limits() -> Result<()> {
    let store = SqliteStore::open_memory().await?;
    let provider = StubEmbeddingProvider::new();
    let chunks = sample_chunks();

    IndexBuilder::new(&store, &provider).build(&chunks).await?;
    let retriever = Retriever::open(store, Arc::new(StubEmbeddingProvider::new())).await?;

    let results = retriever.search("memory safety in rust", 2).await?;
    assert!(results.len() <= 2);
    assert!(results.iter().all(|r| !r.text.is_empty()));
    for pair in results.windows(2) {
        assert!(
            pair[0].score >= pair[1].score,
            "scores must be non-increasing"
        );
    }

    // top_k larger than the index returns everything, without padding.
    let all = retriever.search("anything at all", 50).await?;
    assert_eq!(all.len(), chunks.len());

    Ok(())
}

#[tokio::test]
async fn test_build_rejects_empty_chunk_sequence() -> Result<()> {
    let store = SqliteStore::open_memory().await?;
    let provider = StubEmbeddingProvider::new();

    let result = IndexBuilder::new(&store, &provider).build(&[]).await;
    assert!(result.is_err(), "empty build must fail, not produce an empty index");

    // Nothing was written: the store still has no metadata row.
    assert!(store.get_metadata().await?.is_none());
    assert_eq!(store.chunk_count().await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_retriever_refuses_unbuilt_store() -> Result<()> {
    let store = SqliteStore::open_memory().await?;
    let result = Retriever::open(store, Arc::new(StubEmbeddingProvider::new())).await;
    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn test_retriever_detects_count_mismatch() -> Result<()> {
    let store = SqliteStore::open_memory().await?;
    let provider = StubEmbeddingProvider::new();

    IndexBuilder::new(&store, &provider)
        .build(&sample_chunks())
        .await?;

    // Corrupt the invariant: drop a row behind the metadata's back.
    sqlx::query("DELETE FROM chunks WHERE position = 2")
        .execute(store.pool())
        .await?;

    let result = Retriever::open(store, Arc::new(StubEmbeddingProvider::new())).await;
    assert!(result.is_err(), "count mismatch must fail fast on open");
    Ok(())
}

#[tokio::test]
async fn test_retriever_detects_dimension_mismatch() -> Result<()> {
    let store = SqliteStore::open_memory().await?;

    IndexBuilder::new(&store, &StubEmbeddingProvider::new())
        .build(&sample_chunks())
        .await?;

    let other_space = Arc::new(StubEmbeddingProvider::with_dimension(16));
    let result = Retriever::open(store, other_space).await;
    assert!(result.is_err(), "provider from another embedding space must be rejected");
    Ok(())
}

#[tokio::test]
async fn test_rebuild_overwrites_previous_index() -> Result<()> {
    let store = SqliteStore::open_memory().await?;
    let provider = StubEmbeddingProvider::new();

    IndexBuilder::new(&store, &provider)
        .build(&sample_chunks())
        .await?;

    let smaller = vec!["only chunk left".to_string()];
    IndexBuilder::new(&store, &provider).build(&smaller).await?;

    assert_eq!(store.chunk_count().await?, 1);
    let metadata = store.get_metadata().await?.unwrap();
    assert_eq!(metadata.chunk_count, 1);

    let retriever = Retriever::open(store, Arc::new(StubEmbeddingProvider::new())).await?;
    let results = retriever.search("only chunk left", 5).await?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].text, "only chunk left");

    Ok(())
}

#[tokio::test]
async fn test_index_persists_across_reopen() -> Result<()> {
    let dir = tempdir()?;
    let db_path = dir.path().join("lectern.db");

    {
        let store = SqliteStore::open(&db_path).await?;
        IndexBuilder::new(&store, &StubEmbeddingProvider::new())
            .build(&sample_chunks())
            .await?;
    }

    let reopened = SqliteStore::open(&db_path).await?;
    let retriever = Retriever::open(reopened, Arc::new(StubEmbeddingProvider::new())).await?;
    assert_eq!(retriever.metadata().chunk_count, 3);

    let chunks = sample_chunks();
    let results = retriever.search(&chunks[0], 1).await?;
    assert_eq!(results[0].text, chunks[0]);

    Ok(())
}

#[tokio::test]
async fn test_chunked_document_grounding_flow() -> Result<()> {
    // End-to-end shape of the ask flow: chunk a document, index it, search,
    // and assemble the grounding prompt.
    let paragraphs: Vec<String> = (0..12)
        .map(|i| format!("Paragraph {i}: {}", "facts and figures ".repeat(15)))
        .collect();
    let document = paragraphs.join("\n\n");

    let chunks = TextChunker::new(300, 60).chunk(&document);
    assert!(chunks.len() > 1);

    let store = SqliteStore::open_memory().await?;
    IndexBuilder::new(&store, &StubEmbeddingProvider::new())
        .build(&chunks)
        .await?;

    let retriever = Retriever::open(store, Arc::new(StubEmbeddingProvider::new())).await?;
    let results = retriever.search("Paragraph 3", 4).await?;
    assert!(!results.is_empty());
    assert!(results.len() <= 4);

    let prompt = build_prompt("Paragraph 3", &results);
    assert!(prompt.contains("[Resource 1]"));
    assert!(prompt.contains(results[0].text.as_str()));
    assert!(prompt.ends_with("Question: Paragraph 3"));

    Ok(())
}
