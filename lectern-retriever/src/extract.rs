//! Document text extraction capabilities.
//!
//! Extraction is a narrow injected capability (`path in, raw string out`) so
//! the rest of the pipeline can be exercised with plain strings in tests.
//! The raw output here is not normalized; run it through
//! [`lectern_context::clean_text`] before chunking.

use anyhow::Result;
use std::path::Path;

/// Capability for turning a document file into raw text.
pub trait TextExtractor: Send + Sync {
    /// Extract the document's text content. Failures from the underlying
    /// parser propagate verbatim.
    fn extract_text(&self, path: &Path) -> Result<String>;
}

/// PDF text extraction backed by the `pdf-extract` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String> {
        tracing::info!("Extracting text from {}", path.display());
        let text = pdf_extract::extract_text(path).map_err(|e| {
            anyhow::anyhow!("failed to extract text from {}: {e}", path.display())
        })?;
        tracing::debug!("Extracted {} characters", text.chars().count());
        Ok(text)
    }
}
