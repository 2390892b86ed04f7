pub mod text;

// Re-export the main cleaning and chunking entry points for external use
pub use text::{TextChunker, clean_text, split_paragraphs};
