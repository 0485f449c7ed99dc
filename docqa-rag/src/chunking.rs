//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`RecursiveChunker`]: splits on paragraphs, lines, sentences, then words,
//!   merging pieces back up to the size limit with overlap
//! - [`FixedSizeChunker`]: plain character windows with configurable overlap
//!
//! All sizes are counted in characters, not bytes.

use crate::document::{Chunk, Document};

/// Separators tried by [`RecursiveChunker`], coarsest first.
const SEPARATORS: [&str; 6] = ["\n\n", "\n", ". ", "! ", "? ", " "];

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no embeddings.
/// Embeddings are attached later by the pipeline.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has no non-whitespace text.
    /// Each returned chunk has an empty embedding vector.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;

    /// Strategy name and parameters, e.g. `recursive:1000:200`. Two chunkers
    /// with the same description must cut identical chunks; the pipeline
    /// folds it into the index fingerprint.
    fn describe(&self) -> String;
}

/// Splits text into fixed-size chunks by character count with configurable overlap.
///
/// Chunk IDs are generated as `{document_id}_{chunk_index}`. Each chunk inherits
/// the parent document's metadata plus a `chunk_index` field.
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.trim().is_empty() {
            return Vec::new();
        }

        split_by_size(&document.text, self.chunk_size, self.chunk_overlap)
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk::from_document(document, i, text))
            .collect()
    }

    fn describe(&self) -> String {
        format!("fixed:{}:{}", self.chunk_size, self.chunk_overlap)
    }
}

/// Splits text hierarchically: paragraphs → lines → sentences → words → characters.
///
/// The coarsest separator present in the text is used first. Pieces that still
/// exceed `chunk_size` are split again with the next separator; anything left
/// after the word level is cut into character windows. Small pieces are then
/// merged greedily up to `chunk_size`, and each new chunk starts with the
/// trailing pieces of the previous one totalling at most `chunk_overlap`
/// characters.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1000, 200);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }

    /// Split raw text into chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let Some(position) = separators.iter().position(|sep| text.contains(sep)) else {
            return split_by_size(text, self.chunk_size, self.chunk_overlap);
        };
        let remaining = &separators[position + 1..];

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for piece in split_keeping_separator(text, separators[position]) {
            if char_len(piece) <= self.chunk_size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                chunks.extend(self.merge(&pending));
                pending.clear();
            }
            chunks.extend(self.split_recursive(piece, remaining));
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(&pending));
        }
        chunks
    }

    /// Merge small pieces into chunks of at most `chunk_size` characters,
    /// carrying up to `chunk_overlap` characters of trailing pieces forward.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: Vec<(&str, usize)> = Vec::new();
        let mut total = 0;

        for &piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                push_trimmed(&mut chunks, &window);
                while total > self.chunk_overlap
                    || (total > 0 && total + len > self.chunk_size)
                {
                    let (_, dropped) = window.remove(0);
                    total -= dropped;
                }
            }
            window.push((piece, len));
            total += len;
        }

        push_trimmed(&mut chunks, &window);
        chunks
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.trim().is_empty() {
            return Vec::new();
        }

        self.split_text(&document.text)
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk::from_document(document, i, text))
            .collect()
    }

    fn describe(&self) -> String {
        format!("recursive:{}:{}", self.chunk_size, self.chunk_overlap)
    }
}

fn push_trimmed(chunks: &mut Vec<String>, window: &[(&str, usize)]) {
    let joined: String = window.iter().map(|(piece, _)| *piece).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Character windows of `chunk_size` advancing by `chunk_size - chunk_overlap`.
fn split_by_size(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let boundaries: Vec<usize> =
        text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
    let char_count = boundaries.len() - 1;
    let step = chunk_size.saturating_sub(chunk_overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(char_count);
        chunks.push(text[boundaries[start]..boundaries[end]].to_string());
        if end == char_count {
            break;
        }
        start += step;
    }
    chunks
}
