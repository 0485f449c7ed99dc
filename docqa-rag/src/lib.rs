//! # docqa-rag
//!
//! Retrieval-augmented question answering over a directory of text files.
//!
//! ## Overview
//!
//! Building the index runs once per process:
//!
//! 1. [`load_documents`] reads every matching file into a [`Document`]
//! 2. a [`Chunker`] splits documents into overlapping [`Chunk`]s
//! 3. an [`EmbeddingProvider`] embeds each chunk
//! 4. a [`VectorStore`] stores and persists the vectors
//!
//! Each query is then embedded with the same provider, the top-k chunks are
//! retrieved by cosine similarity, stuffed into one prompt, and answered by a
//! [`GenerationProvider`]. [`RagPipeline`] ties the stages together.
//!
//! ## Features
//!
//! - `ollama` (default): [`OllamaEmbeddingProvider`] and [`OllamaGenerationProvider`]

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod filestore;
pub mod generation;
pub mod inmemory;
pub mod loader;
#[cfg(feature = "ollama")]
pub mod ollama;
pub mod pipeline;
pub mod prompt;
pub mod vectorstore;

pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use filestore::FileVectorStore;
pub use generation::GenerationProvider;
pub use inmemory::InMemoryVectorStore;
pub use loader::{DEFAULT_PATTERN, load_documents};
#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaEmbeddingProvider, OllamaGenerationProvider};
pub use pipeline::{Answer, IndexReport, RagPipeline, RagPipelineBuilder};
pub use prompt::stuff_prompt;
pub use vectorstore::{IndexManifest, VectorStore};
