//! SQLite implementation of the storage traits.
//!
//! Chunk rows and the index metadata row share one database file, which is
//! the whole point of this layout: the similarity index and the chunk text
//! cannot drift apart on disk. Embeddings are stored as BLOBs of f16 values
//! (via `bytemuck`), and similarity search is a brute-force inner-product
//! scan over all stored vectors; exact search is the
//! right trade-off at single-document scale.

use super::{ChunkPosition, ChunkStore, EmbeddingStore, IndexMetadata, IndexedChunk};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Row, SqlitePool};
use std::path::Path;

/// SQLite-backed chunk and embedding store.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens a store with persistent SQLite storage, creating the database
    /// file and tables if missing.
    pub async fn open(path: &Path) -> Result<Self> {
        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(path)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .busy_timeout(std::time::Duration::from_secs(5))
                .foreign_keys(true)
                .create_if_missing(true),
        )
        .await?;
        Self::new_with_pool(pool).await
    }

    /// Opens a store with in-memory SQLite storage, for testing.
    pub async fn open_memory() -> Result<Self> {
        let pool = SqlitePool::connect("sqlite::memory:").await?;
        Self::new_with_pool(pool).await
    }

    async fn new_with_pool(pool: SqlitePool) -> Result<Self> {
        Self::create_tables(&pool).await?;
        Ok(Self { pool })
    }

    async fn create_tables(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                position INTEGER PRIMARY KEY,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS index_metadata (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                model_name TEXT NOT NULL,
                provider TEXT NOT NULL,
                dimension INTEGER NOT NULL,
                normalized BOOLEAN NOT NULL DEFAULT FALSE,
                chunk_count INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Write or replace the single index metadata row.
    pub async fn upsert_metadata(&self, metadata: &IndexMetadata) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO index_metadata
            (id, model_name, provider, dimension, normalized, chunk_count, created_at)
            VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                model_name = excluded.model_name,
                provider = excluded.provider,
                dimension = excluded.dimension,
                normalized = excluded.normalized,
                chunk_count = excluded.chunk_count,
                created_at = excluded.created_at
            "#,
        )
        .bind(&metadata.model_name)
        .bind(&metadata.provider)
        .bind(metadata.dimension as i64)
        .bind(metadata.normalized)
        .bind(metadata.chunk_count as i64)
        .bind(metadata.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Read the index metadata row, if the index has been built.
    pub async fn get_metadata(&self) -> Result<Option<IndexMetadata>> {
        let row = sqlx::query("SELECT * FROM index_metadata WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            let dimension: i64 = row.get("dimension");
            let chunk_count: i64 = row.get("chunk_count");
            Ok(Some(IndexMetadata {
                model_name: row.get("model_name"),
                provider: row.get("provider"),
                dimension: dimension as usize,
                normalized: row.get("normalized"),
                chunk_count: chunk_count as usize,
                created_at: row.get("created_at"),
            }))
        } else {
            Ok(None)
        }
    }

    /// Get the underlying SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> IndexedChunk {
        let position: i64 = row.get("position");
        let content: String = row.get("content");
        let embedding_bytes: Vec<u8> = row.get("embedding");
        let embedding = bytemuck::cast_slice::<u8, half::f16>(&embedding_bytes).to_vec();

        IndexedChunk {
            position,
            content,
            embedding,
        }
    }
}

#[async_trait]
impl ChunkStore for SqliteStore {
    async fn insert_chunks(&self, chunks: &[IndexedChunk]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for chunk in chunks {
            let embedding_bytes = bytemuck::cast_slice::<half::f16, u8>(&chunk.embedding);

            sqlx::query(
                r#"
                INSERT INTO chunks (position, content, embedding)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(position) DO UPDATE SET
                    content = excluded.content,
                    embedding = excluded.embedding
                "#,
            )
            .bind(chunk.position)
            .bind(&chunk.content)
            .bind(embedding_bytes)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_chunk(&self, position: ChunkPosition) -> Result<Option<IndexedChunk>> {
        let row = sqlx::query("SELECT position, content, embedding FROM chunks WHERE position = ?1")
            .bind(position)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(Self::row_to_chunk))
    }

    async fn all_chunks(&self) -> Result<Vec<IndexedChunk>> {
        let rows =
            sqlx::query("SELECT position, content, embedding FROM chunks ORDER BY position")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.iter().map(Self::row_to_chunk).collect())
    }

    async fn chunk_count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM chunks").execute(&self.pool).await?;
        sqlx::query("DELETE FROM index_metadata")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl EmbeddingStore for SqliteStore {
    async fn search_similar(
        &self,
        query: &[half::f16],
        top_k: usize,
    ) -> Result<Vec<(ChunkPosition, f32)>> {
        let chunks = self.all_chunks().await?;

        let mut similarities: Vec<(ChunkPosition, f32)> = chunks
            .iter()
            .map(|chunk| (chunk.position, inner_product(query, &chunk.embedding)))
            .collect();

        // Sort by score (descending)
        similarities.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        similarities.truncate(top_k);

        Ok(similarities)
    }
}

/// Inner product of two f16 vectors, accumulated in f32. Over unit-normalized
/// vectors this is cosine similarity. Mismatched lengths score zero.
fn inner_product(a: &[half::f16], b: &[half::f16]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.to_f32() * y.to_f32())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use half::f16;

    fn chunk(position: i64, content: &str, embedding: &[f32]) -> IndexedChunk {
        IndexedChunk {
            position,
            content: content.to_string(),
            embedding: embedding.iter().copied().map(f16::from_f32).collect(),
        }
    }

    #[tokio::test]
    async fn test_chunk_round_trip() -> Result<()> {
        let store = SqliteStore::open_memory().await?;

        let chunks = vec![
            chunk(0, "first chunk", &[1.0, 0.0, 0.0]),
            chunk(1, "second chunk", &[0.0, 1.0, 0.0]),
        ];
        store.insert_chunks(&chunks).await?;

        assert_eq!(store.chunk_count().await?, 2);

        let fetched = store.all_chunks().await?;
        assert_eq!(fetched, chunks);

        let single = store.get_chunk(1).await?.unwrap();
        assert_eq!(single.content, "second chunk");
        assert!(store.get_chunk(7).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_insert_overwrites_position() -> Result<()> {
        let store = SqliteStore::open_memory().await?;

        store
            .insert_chunks(&[chunk(0, "original", &[1.0, 0.0])])
            .await?;
        store
            .insert_chunks(&[chunk(0, "replacement", &[0.0, 1.0])])
            .await?;

        assert_eq!(store.chunk_count().await?, 1);
        assert_eq!(store.get_chunk(0).await?.unwrap().content, "replacement");

        Ok(())
    }

    #[tokio::test]
    async fn test_search_similar_orders_and_truncates() -> Result<()> {
        let store = SqliteStore::open_memory().await?;

        store
            .insert_chunks(&[
                chunk(0, "x axis", &[1.0, 0.0]),
                chunk(1, "y axis", &[0.0, 1.0]),
                chunk(2, "diagonal", &[0.7071, 0.7071]),
            ])
            .await?;

        let query: Vec<f16> = [1.0f32, 0.0].iter().copied().map(f16::from_f32).collect();
        let results = store.search_similar(&query, 2).await?;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 0);
        assert!(results[0].1 > 0.99);
        assert_eq!(results[1].0, 2);
        assert!(results[0].1 >= results[1].1);

        // top_k larger than the index returns everything
        let all = store.search_similar(&query, 10).await?;
        assert_eq!(all.len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_metadata_round_trip() -> Result<()> {
        let store = SqliteStore::open_memory().await?;
        assert!(store.get_metadata().await?.is_none());

        let metadata = IndexMetadata::new("m".into(), "p".into(), 384)
            .with_normalized(true)
            .with_chunk_count(12);
        store.upsert_metadata(&metadata).await?;

        let fetched = store.get_metadata().await?.unwrap();
        assert_eq!(fetched.model_name, "m");
        assert_eq!(fetched.provider, "p");
        assert_eq!(fetched.dimension, 384);
        assert!(fetched.normalized);
        assert_eq!(fetched.chunk_count, 12);

        // Upsert replaces the single row
        store
            .upsert_metadata(&metadata.clone().with_chunk_count(3))
            .await?;
        assert_eq!(store.get_metadata().await?.unwrap().chunk_count, 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_clear_removes_chunks_and_metadata() -> Result<()> {
        let store = SqliteStore::open_memory().await?;

        store
            .insert_chunks(&[chunk(0, "something", &[1.0])])
            .await?;
        store
            .upsert_metadata(&IndexMetadata::new("m".into(), "p".into(), 1).with_chunk_count(1))
            .await?;

        store.clear().await?;
        assert_eq!(store.chunk_count().await?, 0);
        assert!(store.get_metadata().await?.is_none());

        Ok(())
    }

    #[test]
    fn test_inner_product() {
        let v = |values: &[f32]| -> Vec<f16> {
            values.iter().copied().map(f16::from_f32).collect()
        };

        // Identical unit vectors
        assert!((inner_product(&v(&[1.0, 0.0]), &v(&[1.0, 0.0])) - 1.0).abs() < 1e-3);
        // Orthogonal vectors
        assert_eq!(inner_product(&v(&[1.0, 0.0]), &v(&[0.0, 1.0])), 0.0);
        // Opposite vectors
        assert!((inner_product(&v(&[1.0, 0.0]), &v(&[-1.0, 0.0])) + 1.0).abs() < 1e-3);
        // Mismatched lengths score zero
        assert_eq!(inner_product(&v(&[1.0]), &v(&[1.0, 2.0])), 0.0);
    }
}
