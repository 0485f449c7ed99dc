//! Text units flowing through the pipeline: loaded files, their chunks, and
//! scored chunks coming back from a search.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Metadata key holding a document's path relative to the documents directory.
pub const SOURCE_KEY: &str = "source";

/// Metadata key holding a chunk's position within its document.
pub const CHUNK_INDEX_KEY: &str = "chunk_index";

/// One loaded file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Stable id; the loader derives it from the relative path.
    pub id: String,
    /// Full file contents.
    pub text: String,
    /// Copied onto every chunk cut from this document.
    pub metadata: HashMap<String, String>,
    /// Absolute location of the file, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: HashMap::new(), source_uri: None }
    }

    /// Relative path recorded by the loader.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }
}

/// A bounded slice of one [`Document`], embedded once it has been indexed.
///
/// Chunks never span documents: `document_id` always names the parent and
/// `text` is a substring of the parent's text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// `{document_id}_{position}`.
    pub id: String,
    pub text: String,
    /// Empty until the embedding provider has run.
    pub embedding: Vec<f32>,
    pub metadata: HashMap<String, String>,
    pub document_id: String,
}

impl Chunk {
    /// The `index`-th chunk of `document`, not yet embedded.
    pub(crate) fn from_document(document: &Document, index: usize, text: String) -> Self {
        let mut metadata = document.metadata.clone();
        metadata.insert(CHUNK_INDEX_KEY.to_string(), index.to_string());
        Self {
            id: format!("{}_{index}", document.id),
            text,
            embedding: Vec::new(),
            metadata,
            document_id: document.id.clone(),
        }
    }
}

/// A chunk returned by a vector search, with its cosine similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub score: f32,
}
