//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates the full ingest-and-answer workflow by
//! composing an [`EmbeddingProvider`], a [`GenerationProvider`], a
//! [`VectorStore`] and a [`Chunker`].
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{RagPipeline, RagConfig, FileVectorStore, RecursiveChunker};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .generation_provider(Arc::new(generator))
//!     .vector_store(Arc::new(FileVectorStore::open("./chroma_db").await?))
//!     .chunker(Arc::new(RecursiveChunker::new(1000, 200)))
//!     .build()?;
//!
//! pipeline.initialize_from_dir("docs", "./documents", "**/*.txt", false).await?;
//! let answer = pipeline.answer("docs", "What color is the sky?").await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};

use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::document::{Chunk, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::GenerationProvider;
use crate::loader::load_documents;
use crate::prompt::stuff_prompt;
use crate::vectorstore::{IndexManifest, VectorStore};

/// Outcome of [`RagPipeline::initialize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    /// Number of source documents the index covers.
    pub documents: usize,
    /// Number of chunks in the index.
    pub chunks: usize,
    /// `true` when a persisted index was reused without re-embedding.
    pub reused: bool,
}

/// A generated answer together with the chunks it was conditioned on.
#[derive(Debug, Clone)]
pub struct Answer {
    /// The model's response text.
    pub text: String,
    /// Retrieved chunks in the order they were placed in the prompt.
    pub sources: Vec<SearchResult>,
}

/// The RAG pipeline orchestrator.
///
/// Coordinates index building (load → chunk → embed → store → persist) and
/// query answering (embed → search → filter → prompt → generate). Construct
/// one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    generation_provider: Arc<dyn GenerationProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Create a named collection in the vector store.
    pub async fn create_collection(&self, name: &str) -> Result<()> {
        self.vector_store.create_collection(name).await.inspect_err(|e| {
            error!(collection = name, error = %e, "failed to create collection");
        })
    }

    /// Delete a named collection from the vector store.
    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        self.vector_store.delete_collection(name).await.inspect_err(|e| {
            error!(collection = name, error = %e, "failed to delete collection");
        })
    }

    /// Ingest a single document: chunk → embed → store.
    ///
    /// Returns the chunks that were stored (with embeddings attached).
    ///
    /// # Errors
    ///
    /// Propagates the provider or store error, logging the document ID.
    pub async fn ingest(&self, collection: &str, document: &Document) -> Result<Vec<Chunk>> {
        let chunks = self.embed_document(document).await?;
        if chunks.is_empty() {
            info!(document.id = %document.id, chunk_count = 0, "ingested document (empty)");
            return Ok(chunks);
        }

        self.vector_store.upsert(collection, &chunks).await.inspect_err(|e| {
            error!(document.id = %document.id, error = %e, "upsert failed during ingestion");
        })?;

        let chunk_count = chunks.len();
        info!(document.id = %document.id, chunk_count, "ingested document");

        Ok(chunks)
    }

    /// Chunk `document` and attach embeddings, without touching the store.
    async fn embed_document(&self, document: &Document) -> Result<Vec<Chunk>> {
        let mut chunks = self.chunker.chunk(document);
        if chunks.is_empty() {
            return Ok(chunks);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings =
            self.embedding_provider.embed_batch(&texts).await.inspect_err(|e| {
                error!(document.id = %document.id, error = %e, "embedding failed during ingestion");
            })?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::PipelineError(format!(
                "embedding provider returned {} vectors for {} chunks of document '{}'",
                embeddings.len(),
                chunks.len(),
                document.id
            )));
        }

        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }
        Ok(chunks)
    }

    /// Ingest multiple documents, stopping at the first failure.
    pub async fn ingest_batch(
        &self,
        collection: &str,
        documents: &[Document],
    ) -> Result<Vec<Chunk>> {
        let mut all_chunks = Vec::new();
        for document in documents {
            let chunks = self.ingest(collection, document).await?;
            all_chunks.extend(chunks);
        }
        Ok(all_chunks)
    }

    /// Fingerprint of everything that determines the index contents.
    pub fn fingerprint(&self, documents: &[Document]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.embedding_provider.model_name().as_bytes());
        hasher.update([0]);
        hasher.update(self.chunker.describe().as_bytes());
        hasher.update([0]);
        for document in documents {
            hasher.update(document.id.as_bytes());
            hasher.update([0]);
            hasher.update(document.text.as_bytes());
            hasher.update([0]);
        }
        format!("{:x}", hasher.finalize())
    }

    /// Build the index for `collection` from `documents`, or reuse the
    /// persisted one if it was built from the same inputs.
    ///
    /// A rebuild embeds every document, then replaces the collection and
    /// persists it with a fresh [`IndexManifest`]; an embedding failure leaves
    /// the previous index untouched. `force_rebuild` skips the
    /// reuse check. Running this twice on unchanged inputs yields the same
    /// chunk count.
    pub async fn initialize(
        &self,
        collection: &str,
        documents: &[Document],
        force_rebuild: bool,
    ) -> Result<IndexReport> {
        let fingerprint = self.fingerprint(documents);

        if !force_rebuild {
            if let Some(report) = self.reusable(collection, &fingerprint).await? {
                info!(collection, chunk_count = report.chunks, "reusing persisted index");
                return Ok(report);
            }
        }

        info!(collection, document_count = documents.len(), force_rebuild, "building index");
        // The old collection is dropped only once every chunk is embedded.
        let mut chunks = Vec::new();
        for document in documents {
            chunks.extend(self.embed_document(document).await?);
        }

        self.delete_collection(collection).await?;
        self.create_collection(collection).await?;
        if chunks.is_empty() {
            warn!(collection, "index is empty; every query will find nothing");
        } else {
            self.vector_store.upsert(collection, &chunks).await.inspect_err(|e| {
                error!(collection, error = %e, "upsert failed during rebuild");
            })?;
        }

        let manifest = IndexManifest {
            fingerprint,
            embedding_model: self.embedding_provider.model_name().to_string(),
            document_count: documents.len(),
            chunk_count: chunks.len(),
            built_at: Utc::now(),
        };
        self.vector_store.persist(collection, &manifest).await.inspect_err(|e| {
            error!(collection, error = %e, "failed to persist index");
        })?;

        info!(collection, chunk_count = chunks.len(), "index built");
        Ok(IndexReport { documents: documents.len(), chunks: chunks.len(), reused: false })
    }

    async fn reusable(&self, collection: &str, fingerprint: &str) -> Result<Option<IndexReport>> {
        let Some(manifest) = self.vector_store.manifest(collection).await? else {
            return Ok(None);
        };
        let stored = self.vector_store.count(collection).await?;
        if manifest.fingerprint != fingerprint || stored != Some(manifest.chunk_count) {
            info!(collection, "persisted index is stale");
            return Ok(None);
        }
        Ok(Some(IndexReport {
            documents: manifest.document_count,
            chunks: manifest.chunk_count,
            reused: true,
        }))
    }

    /// Load documents from `dir` matching `pattern`, then [`initialize`](Self::initialize).
    ///
    /// The folder walk runs on the blocking thread pool.
    pub async fn initialize_from_dir(
        &self,
        collection: &str,
        dir: impl AsRef<Path>,
        pattern: &str,
        force_rebuild: bool,
    ) -> Result<IndexReport> {
        let dir = dir.as_ref().to_path_buf();
        let owned_pattern = pattern.to_string();
        let documents = tokio::task::spawn_blocking(move || load_documents(&dir, &owned_pattern))
            .await
            .map_err(|e| RagError::LoaderError(format!("document loading task failed: {e}")))??;
        self.initialize(collection, &documents, force_rebuild).await
    }

    /// Retrieve the chunks most relevant to `query`: embed → search → filter.
    ///
    /// Returns results ordered by descending similarity. Results below the
    /// configured `similarity_threshold` are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ValidationError`] for a blank query, otherwise
    /// propagates embedding or search failures.
    pub async fn query(&self, collection: &str, query: &str) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Err(RagError::ValidationError("query must not be empty".to_string()));
        }

        // 1. Embed the query
        let query_embedding = self.embedding_provider.embed(query).await.inspect_err(|e| {
            error!(error = %e, "embedding failed during query");
        })?;

        // 2. Search the vector store
        let results = self
            .vector_store
            .search(collection, &query_embedding, self.config.top_k)
            .await
            .inspect_err(|e| {
                error!(collection, error = %e, "vector store search failed");
            })?;

        // 3. Filter by similarity threshold
        let threshold = self.config.similarity_threshold;
        let filtered: Vec<SearchResult> =
            results.into_iter().filter(|r| r.score >= threshold).collect();

        info!(result_count = filtered.len(), "query completed");

        Ok(filtered)
    }

    /// Answer `query` from the indexed documents.
    ///
    /// All retrieved chunks are stuffed into a single prompt and the
    /// generation model is called once.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::RetrievalEmpty`] if nothing relevant was found, and
    /// propagates validation, provider and store errors unchanged.
    pub async fn answer(&self, collection: &str, query: &str) -> Result<Answer> {
        let sources = self.query(collection, query).await?;
        if sources.is_empty() {
            return Err(RagError::RetrievalEmpty { collection: collection.to_string() });
        }

        let prompt = stuff_prompt(query, &sources);
        let text = self.generation_provider.generate(&prompt).await.inspect_err(|e| {
            error!(model = self.generation_provider.model_name(), error = %e, "generation failed");
        })?;

        info!(source_count = sources.len(), answer_len = text.len(), "answered query");
        Ok(Answer { text: text.trim().to_string(), sources })
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// All fields are required. Call [`build()`](RagPipelineBuilder::build)
/// to validate and produce the pipeline.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    generation_provider: Option<Arc<dyn GenerationProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the generation provider.
    pub fn generation_provider(mut self, provider: Arc<dyn GenerationProvider>) -> Self {
        self.generation_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let generation_provider = self
            .generation_provider
            .ok_or_else(|| RagError::ConfigError("generation_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let chunker =
            self.chunker.ok_or_else(|| RagError::ConfigError("chunker is required".to_string()))?;

        Ok(RagPipeline { config, embedding_provider, generation_provider, vector_store, chunker })
    }
}
