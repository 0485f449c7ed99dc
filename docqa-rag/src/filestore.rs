//! Vector store persisted to a directory on disk.
//!
//! Each collection is kept in memory for search and written to
//! `<dir>/<collection>.json` on [`persist`](VectorStore::persist). Writes go
//! to a temporary file first and are renamed into place, so a crash never
//! leaves a half-written index behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::inmemory::{Collection, InMemoryVectorStore};
use crate::vectorstore::{IndexManifest, VectorStore};

/// A [`VectorStore`] that survives restarts by persisting to a directory.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::FileVectorStore;
///
/// let store = FileVectorStore::open("./chroma_db").await?;
/// ```
#[derive(Debug)]
pub struct FileVectorStore {
    dir: PathBuf,
    inner: InMemoryVectorStore,
}

impl FileVectorStore {
    /// Open (creating if necessary) the index directory and load every
    /// persisted collection in it.
    ///
    /// Unreadable or corrupt collection files are skipped with a warning; the
    /// pipeline rebuilds such collections on the next initialization.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PersistenceError`] if the directory cannot be
    /// created or listed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| persistence_error(&dir, e))?;

        let inner = InMemoryVectorStore::new();
        let mut entries = tokio::fs::read_dir(&dir).await.map_err(|e| persistence_error(&dir, e))?;
        while let Some(entry) = entries.next_entry().await.map_err(|e| persistence_error(&dir, e))? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            match read_collection(&path).await {
                Ok(collection) => {
                    debug!(collection = %name, chunk_count = collection.chunks.len(), "loaded collection");
                    inner.import(&name, collection).await;
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable collection"),
            }
        }

        info!(dir = %dir.display(), "opened vector index");
        Ok(Self { dir, inner })
    }

    /// The directory this store persists to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn collection_path(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(RagError::VectorStoreError {
                backend: "File".to_string(),
                message: format!("invalid collection name '{name}'"),
            });
        }
        Ok(self.dir.join(format!("{name}.json")))
    }
}

async fn read_collection(path: &Path) -> Result<Collection> {
    let bytes = tokio::fs::read(path).await.map_err(|e| persistence_error(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| persistence_error(path, e))
}

fn persistence_error(path: &Path, err: impl std::fmt::Display) -> RagError {
    RagError::PersistenceError { path: path.display().to_string(), message: err.to_string() }
}

#[async_trait]
impl VectorStore for FileVectorStore {
    async fn create_collection(&self, name: &str) -> Result<()> {
        self.collection_path(name)?;
        self.inner.create_collection(name).await
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let path = self.collection_path(name)?;
        self.inner.delete_collection(name).await?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(persistence_error(&path, e)),
        }
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        self.inner.upsert(collection, chunks).await
    }

    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()> {
        self.inner.delete(collection, ids).await
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        self.inner.search(collection, embedding, top_k).await
    }

    async fn count(&self, collection: &str) -> Result<Option<usize>> {
        self.inner.count(collection).await
    }

    async fn manifest(&self, collection: &str) -> Result<Option<IndexManifest>> {
        self.inner.manifest(collection).await
    }

    async fn persist(&self, collection: &str, manifest: &IndexManifest) -> Result<()> {
        let path = self.collection_path(collection)?;
        self.inner.set_manifest(collection, manifest).await?;
        let snapshot = self.inner.export(collection).await.ok_or_else(|| {
            RagError::VectorStoreError {
                backend: "File".to_string(),
                message: format!("collection '{collection}' does not exist"),
            }
        })?;

        let bytes = serde_json::to_vec(&snapshot).map_err(|e| persistence_error(&path, e))?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await.map_err(|e| persistence_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| persistence_error(&path, e))?;

        info!(collection, path = %path.display(), chunk_count = snapshot.chunks.len(), "persisted collection");
        Ok(())
    }
}
