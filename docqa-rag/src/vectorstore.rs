//! Vector store trait for storing and searching vector embeddings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// Describes the inputs a persisted collection was built from.
///
/// [`RagPipeline::initialize`](crate::RagPipeline::initialize) compares the
/// stored fingerprint with the current one to decide whether the index can be
/// reused as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexManifest {
    /// SHA-256 over document paths and texts, the embedding model and chunking settings.
    pub fingerprint: String,
    /// Embedding model used to build the collection.
    pub embedding_model: String,
    /// Number of source documents.
    pub document_count: usize,
    /// Number of stored chunks.
    pub chunk_count: usize,
    /// When the collection was built.
    pub built_at: DateTime<Utc>,
}

/// A storage backend for vector embeddings with similarity search.
///
/// Implementations manage named collections of [`Chunk`]s and support
/// upserting, deleting, and searching by cosine similarity. Within a
/// collection all embeddings share one dimensionality, fixed by the first
/// upsert.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{VectorStore, InMemoryVectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("docs").await?;
/// store.upsert("docs", &chunks).await?;
/// let results = store.search("docs", &query_embedding, 3).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection. No-op if it already exists.
    async fn create_collection(&self, name: &str) -> Result<()>;

    /// Delete a named collection and all its data. No-op if it does not exist.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Upsert chunks into a collection. Chunks must have embeddings set.
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Delete chunks by their IDs from a collection.
    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()>;

    /// Search for the `top_k` most similar chunks to the given embedding.
    ///
    /// Returns results ordered by descending similarity score. Equal scores
    /// keep the order in which the chunks were first inserted.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Number of chunks in a collection, or `None` if it does not exist.
    async fn count(&self, collection: &str) -> Result<Option<usize>>;

    /// The manifest recorded by the last [`persist`](VectorStore::persist), if any.
    async fn manifest(&self, collection: &str) -> Result<Option<IndexManifest>>;

    /// Make `collection` durable and record its manifest.
    async fn persist(&self, collection: &str, manifest: &IndexManifest) -> Result<()>;
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
