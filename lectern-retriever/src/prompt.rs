//! Grounding prompt assembly.

use crate::retriever::SearchResult;
use std::fmt::Write;

/// Number of chunks retrieved for the end-to-end grounding flow.
pub const DEFAULT_GROUNDING_TOP_K: usize = 4;

/// Format retrieved chunks and the user's question into a single grounding
/// prompt for a downstream language model. Pure string formatting: each
/// result becomes a numbered resource block, in the order given, followed
/// by the question.
pub fn build_prompt(query: &str, results: &[SearchResult]) -> String {
    let mut prompt = String::from(
        "You are a careful assistant.\n\
         Answer strictly from the resources below. If they do not contain \
         the answer, say so instead of guessing.\n\n",
    );

    for (i, result) in results.iter().enumerate() {
        let _ = writeln!(prompt, "[Resource {}]\n{}\n", i + 1, result.text);
    }

    let _ = write!(prompt, "Question: {query}");
    prompt
}
