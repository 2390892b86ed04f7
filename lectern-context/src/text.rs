//! Text normalization and chunking for retrieval pipelines.
//!
//! This module turns raw extracted document text (typically the output of a
//! PDF text extractor) into bounded, overlapping chunks suitable for
//! embedding models. It has two stages:
//!
//! - [`clean_text`]: normalizes raw page text: collapses runs of blank
//!   lines, blanks out page-number-only lines, and trims the result.
//! - [`TextChunker`]: packs blank-line-delimited paragraphs into chunks of
//!   at most `max_chars` characters, duplicating the tail of each chunk's
//!   accumulation buffer into the next chunk so that context spanning a
//!   chunk boundary is still retrievable.
//!
//! Both stages are pure string transforms with no error paths: identical
//! input and parameters always produce an identical chunk sequence.
//!
//! # Usage
//!
//! ```
//! use lectern_context::text::{TextChunker, clean_text};
//!
//! let raw = "Introduction\n\n\n\n1\n\nThe first paragraph of the document.";
//! let cleaned = clean_text(raw);
//!
//! let chunker = TextChunker::default();
//! let chunks = chunker.chunk(&cleaned);
//! assert!(!chunks.is_empty());
//! ```
use regex::Regex;
use std::sync::OnceLock;

/// Default maximum chunk length, in characters.
pub const DEFAULT_MAX_CHARS: usize = 800;

/// Default number of trailing characters carried over into the next chunk.
pub const DEFAULT_OVERLAP: usize = 150;

fn blank_line_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").unwrap())
}

fn page_number_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\d+\s*$").unwrap())
}

fn paragraph_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{2,}").unwrap())
}

/// Normalize raw extracted page text.
///
/// Collapses runs of three or more newlines down to exactly two (the
/// paragraph separator), blanks out lines consisting solely of whitespace
/// and digits (page numbers), and trims the whole result. Page-number
/// removal is applied line by line, independent of the blank-line collapse.
pub fn clean_text(raw: &str) -> String {
    let collapsed = blank_line_runs().replace_all(raw, "\n\n");
    let without_page_numbers: Vec<&str> = collapsed
        .lines()
        .map(|line| {
            if page_number_line().is_match(line) {
                ""
            } else {
                line
            }
        })
        .collect();
    without_page_numbers.join("\n").trim().to_string()
}

/// Split text into trimmed, non-empty paragraphs on blank-line boundaries
/// (two or more consecutive newlines).
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    paragraph_break()
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Splits document text into bounded, overlapping chunks.
///
/// Paragraphs are accumulated into a buffer until adding the next one would
/// push the buffer past `max_chars` characters; the buffer is then flushed
/// as a chunk and the next buffer is seeded with the last `overlap`
/// characters of the previous (untrimmed) buffer. A single paragraph longer
/// than `max_chars` is emitted whole rather than split internally, so chunk
/// length is not a strict bound in that case.
#[derive(Debug, Clone)]
pub struct TextChunker {
    max_chars: usize,
    overlap: usize,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl TextChunker {
    /// Create a chunker with explicit bounds.
    ///
    /// `max_chars` is the character budget per chunk; `overlap` is how many
    /// trailing characters of each accumulation buffer are duplicated into
    /// the next chunk. An `overlap` of zero disables carry-over entirely.
    pub fn new(max_chars: usize, overlap: usize) -> Self {
        Self { max_chars, overlap }
    }

    /// Maximum chunk length in characters.
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Overlap carried between consecutive chunks, in characters.
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into an ordered sequence of chunks.
    ///
    /// The position of a chunk in the returned vector is its identity: the
    /// index builder relies on this ordering staying stable between runs.
    /// Empty input produces an empty sequence.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut buf = String::new();
        let mut buf_chars = 0usize;

        for paragraph in split_paragraphs(text) {
            let paragraph_chars = paragraph.chars().count();
            if buf_chars + paragraph_chars <= self.max_chars {
                buf.push_str(paragraph);
                buf.push_str("\n\n");
                buf_chars += paragraph_chars + 2;
            } else {
                let flushed = buf.trim();
                if !flushed.is_empty() {
                    chunks.push(flushed.to_string());
                }
                // The overlap seed is sliced from the untrimmed buffer, so
                // it may begin with part of the trailing separator.
                let mut next = tail_chars(&buf, self.overlap).to_string();
                next.push_str(paragraph);
                next.push_str("\n\n");
                buf_chars = next.chars().count();
                buf = next;
            }
        }

        let trailing = buf.trim();
        if !trailing.is_empty() {
            chunks.push(trailing.to_string());
        }

        chunks
    }
}

/// The last `n` characters of `s`, sliced on a char boundary. Returns the
/// whole string when it has `n` characters or fewer, and the empty string
/// when `n` is zero.
fn tail_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}
