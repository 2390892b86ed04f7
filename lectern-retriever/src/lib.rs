//! lectern-retriever: PDF ingestion, vector indexing, and retrieval
//!
//! This crate ties the lectern pipeline together: it extracts text from a
//! PDF, chunks it via `lectern-context`, embeds the chunks via
//! `lectern-embed`, stores text and vectors together in SQLite, and answers
//! similarity queries whose results feed a grounding prompt for a language
//! model.
//!
//! ## Key Modules
//!
//! - **[`extract`]**: PDF-to-text capability
//! - **[`storage`]**: combined chunk/embedding store with build metadata
//! - **[`builder`]**: build-time orchestration (chunks → embeddings → store)
//! - **[`retriever`]**: query-time search returning scored chunks
//! - **[`prompt`]**: grounding prompt assembly
//!
//! ## Architecture
//!
//! ```text
//! PDF → extract → clean/chunk → embed → SqliteStore     (build time)
//! Query → embed → search_similar → SearchResults → Prompt  (query time)
//! ```

pub mod builder;
pub mod extract;
pub mod prompt;
pub mod retriever;
pub mod storage;

pub use builder::IndexBuilder;
pub use extract::{PdfTextExtractor, TextExtractor};
pub use prompt::build_prompt;
pub use retriever::{Retriever, SearchResult};
