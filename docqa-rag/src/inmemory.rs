//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a vector store backed by a
//! `HashMap` of insertion-ordered collections protected by a
//! `tokio::sync::RwLock`. It is also the working set behind
//! [`FileVectorStore`](crate::FileVectorStore).

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{IndexManifest, VectorStore, cosine_similarity};

const BACKEND: &str = "InMemory";

/// One named collection. Chunks keep insertion order so equal scores are
/// returned deterministically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Collection {
    pub(crate) chunks: Vec<Chunk>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
    pub(crate) dimensions: Option<usize>,
    pub(crate) manifest: Option<IndexManifest>,
}

impl Collection {
    /// Rebuild the ID lookup after deserialization or removal.
    pub(crate) fn reindex(&mut self) {
        self.positions =
            self.chunks.iter().enumerate().map(|(i, c)| (c.id.clone(), i)).collect();
    }

    fn upsert(&mut self, name: &str, chunk: &Chunk) -> Result<()> {
        if chunk.embedding.is_empty() {
            return Err(store_error(format!("chunk '{}' has no embedding", chunk.id)));
        }
        let dims = *self.dimensions.get_or_insert(chunk.embedding.len());
        if chunk.embedding.len() != dims {
            return Err(store_error(format!(
                "chunk '{}' has {} dimensions but collection '{name}' expects {dims}",
                chunk.id,
                chunk.embedding.len()
            )));
        }
        match self.positions.get(&chunk.id) {
            Some(&i) => self.chunks[i] = chunk.clone(),
            None => {
                self.positions.insert(chunk.id.clone(), self.chunks.len());
                self.chunks.push(chunk.clone());
            }
        }
        Ok(())
    }
}

/// An in-memory vector store using cosine similarity for search.
///
/// All operations are async-safe via `tokio::sync::RwLock`; searches take a
/// read lock and can run concurrently.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("docs").await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot a collection for serialization.
    pub(crate) async fn export(&self, name: &str) -> Option<Collection> {
        self.collections.read().await.get(name).cloned()
    }

    /// Replace a collection wholesale, e.g. after reading it from disk.
    pub(crate) async fn import(&self, name: &str, mut collection: Collection) {
        collection.reindex();
        self.collections.write().await.insert(name.to_string(), collection);
    }

    pub(crate) async fn set_manifest(&self, name: &str, manifest: &IndexManifest) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(name).ok_or_else(|| missing(name))?;
        store.manifest = Some(manifest.clone());
        Ok(())
    }
}

fn store_error(message: String) -> RagError {
    RagError::VectorStoreError { backend: BACKEND.to_string(), message }
}

fn missing(collection: &str) -> RagError {
    store_error(format!("collection '{collection}' does not exist"))
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        for chunk in chunks {
            store.upsert(collection, chunk)?;
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        store.chunks.retain(|c| !ids.contains(&c.id.as_str()));
        store.reindex();
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing(collection))?;

        if let Some(dims) = store.dimensions.filter(|&d| d != embedding.len()) {
            return Err(store_error(format!(
                "query has {} dimensions but collection '{collection}' expects {dims}",
                embedding.len()
            )));
        }

        let mut scored: Vec<SearchResult> = store
            .chunks
            .iter()
            .map(|chunk| {
                // Overflowing vectors give NaN; rank them last.
                let score = cosine_similarity(&chunk.embedding, embedding);
                let score = if score.is_nan() { f32::NEG_INFINITY } else { score };
                SearchResult { chunk: chunk.clone(), score }
            })
            .collect();

        // Stable sort: ties keep insertion order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn count(&self, collection: &str) -> Result<Option<usize>> {
        Ok(self.collections.read().await.get(collection).map(|c| c.chunks.len()))
    }

    async fn manifest(&self, collection: &str) -> Result<Option<IndexManifest>> {
        Ok(self.collections.read().await.get(collection).and_then(|c| c.manifest.clone()))
    }

    async fn persist(&self, collection: &str, manifest: &IndexManifest) -> Result<()> {
        self.set_manifest(collection, manifest).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: id.to_string(),
            text: format!("text of {id}"),
            embedding,
            metadata: HashMap::new(),
            document_id: "doc".to_string(),
        }
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c").await.unwrap();
        let chunks = ["b", "a", "c"].map(|id| chunk(id, vec![1.0, 0.0]));
        store.upsert("c", &chunks).await.unwrap();

        let results = store.search("c", &[1.0, 0.0], 3).await.unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.chunk.id.as_str()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[tokio::test]
    async fn overflowing_vectors_rank_last() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c").await.unwrap();
        let huge = chunk("huge", vec![f32::MAX, f32::MAX]);
        let chunks = [huge, chunk("a", vec![1.0, 0.0]), chunk("b", vec![0.0, 1.0])];
        store.upsert("c", &chunks).await.unwrap();

        let results = store.search("c", &[1.0, 1.0], 3).await.unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.chunk.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "huge"]);
        assert_eq!(results[2].score, f32::NEG_INFINITY);
    }

    #[tokio::test]
    async fn upsert_replaces_existing_ids_in_place() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c").await.unwrap();
        store.upsert("c", &[chunk("x", vec![1.0, 0.0]), chunk("y", vec![0.0, 1.0])]).await.unwrap();
        store.upsert("c", &[chunk("x", vec![0.0, 1.0])]).await.unwrap();

        assert_eq!(store.count("c").await.unwrap(), Some(2));
        let top = store.search("c", &[0.0, 1.0], 1).await.unwrap();
        assert_eq!(top[0].chunk.id, "x");
    }

    #[tokio::test]
    async fn rejects_dimension_mismatch() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c").await.unwrap();
        store.upsert("c", &[chunk("x", vec![1.0, 0.0])]).await.unwrap();

        assert!(store.upsert("c", &[chunk("y", vec![1.0, 0.0, 0.0])]).await.is_err());
        assert!(store.search("c", &[1.0], 1).await.is_err());
        assert!(store.upsert("c", &[chunk("z", vec![])]).await.is_err());
    }

    #[tokio::test]
    async fn delete_removes_chunks_and_missing_collection_errors() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c").await.unwrap();
        store.upsert("c", &[chunk("x", vec![1.0]), chunk("y", vec![1.0])]).await.unwrap();
        store.delete("c", &["x"]).await.unwrap();
        assert_eq!(store.count("c").await.unwrap(), Some(1));

        assert!(store.search("absent", &[1.0], 1).await.is_err());
        assert_eq!(store.count("absent").await.unwrap(), None);
    }
}
