//! # lectern-embed
//!
//! Text embedding generation for the lectern retrieval pipeline, built on
//! local ONNX models via FastEmbed. Designed for async operation with a
//! small provider abstraction so the rest of the pipeline can be tested
//! against stub implementations.
//!
//! ## Features
//!
//! - **Local ONNX Models**: embeddings are computed in-process, no API calls
//! - **Model Caching**: the loaded model is cached process-wide, so building
//!   an index and answering queries share one model instance
//! - **Half-Precision**: vectors are stored as f16 to halve memory and disk
//!   footprint
//! - **Unit Normalization**: vectors are normalized by default so that
//!   inner-product search behaves as cosine similarity
//!
//! ## Quick Start
//!
//! ```no_run
//! use lectern_embed::{EmbedConfig, EmbeddingProvider, FastEmbedProvider};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = FastEmbedProvider::create(EmbedConfig::default()).await?;
//!
//! let texts = vec!["Hello world".to_string(), "How are you?".to_string()];
//! let result = provider.embed_texts(&texts).await?;
//!
//! println!(
//!     "Generated {} embeddings of dimension {}",
//!     result.len(),
//!     result.dimension
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`] using the crate's [`EmbedError`]
//! type, which chains the underlying model, IO, and task-join failures.

pub mod config;
pub mod error;
pub mod provider;

// Re-export main types for easy access
pub use config::EmbedConfig;
pub use error::{EmbedError, Result};
pub use provider::{EmbeddingProvider, EmbeddingResult, FastEmbedProvider};
