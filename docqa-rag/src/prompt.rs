//! Prompt assembly for the "stuff" strategy: every retrieved chunk goes into one prompt.

use crate::document::SearchResult;

const INSTRUCTION: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.";

/// Build the generation prompt from retrieved chunks and the user's question.
///
/// Chunks appear in retrieval order separated by blank lines. No length check
/// is made; the combined context must fit the model's input window.
pub fn stuff_prompt(query: &str, results: &[SearchResult]) -> String {
    let context =
        results.iter().map(|r| r.chunk.text.as_str()).collect::<Vec<_>>().join("\n\n");
    format!("{INSTRUCTION}\n\n{context}\n\nQuestion: {query}\nHelpful Answer:")
}
