//! Service configuration from command-line flags and `DOCQA_*` variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use docqa_rag::config::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_TOP_K, NO_THRESHOLD};
use docqa_rag::ollama::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use docqa_rag::{Chunker, FixedSizeChunker, RagConfig, RecursiveChunker};

/// How documents are split before embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChunkStrategy {
    /// Split on paragraphs, lines, sentences and words before cutting.
    Recursive,
    /// Plain character windows.
    Fixed,
}

/// Answer questions about a folder of text files using a local Ollama model.
#[derive(Parser, Debug, Clone)]
#[command(name = "docqa", version, about, long_about = None)]
pub struct ServiceConfig {
    /// Address to listen on.
    #[arg(long, env = "DOCQA_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, env = "DOCQA_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Folder scanned for documents at startup.
    #[arg(long, env = "DOCQA_DOCUMENTS_DIR", default_value = "./documents")]
    pub documents_dir: PathBuf,

    /// Glob, relative to the documents folder, selecting files to index.
    #[arg(long, env = "DOCQA_PATTERN", default_value = docqa_rag::DEFAULT_PATTERN)]
    pub pattern: String,

    /// Folder where the vector index is persisted.
    #[arg(long, env = "DOCQA_INDEX_DIR", default_value = "./chroma_db")]
    pub index_dir: PathBuf,

    /// Collection name inside the index folder.
    #[arg(long, env = "DOCQA_COLLECTION", default_value = "documents")]
    pub collection: String,

    /// Base URL of the Ollama server.
    #[arg(long, env = "DOCQA_OLLAMA_URL", default_value = DEFAULT_BASE_URL)]
    pub ollama_url: String,

    /// Model used to embed chunks and queries.
    #[arg(long, env = "DOCQA_EMBEDDING_MODEL", default_value = DEFAULT_MODEL)]
    pub embedding_model: String,

    /// Model used to generate answers.
    #[arg(long, env = "DOCQA_GENERATION_MODEL", default_value = DEFAULT_MODEL)]
    pub generation_model: String,

    /// Per-request timeout for Ollama calls, in seconds.
    #[arg(long, env = "DOCQA_TIMEOUT_SECS", default_value_t = 120)]
    pub timeout_secs: u64,

    /// Browser origin allowed to call the API with credentials.
    #[arg(long, env = "DOCQA_CORS_ORIGIN", default_value = "http://localhost:5173")]
    pub cors_origin: String,

    /// Maximum chunk length in characters.
    #[arg(long, env = "DOCQA_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks.
    #[arg(long, env = "DOCQA_CHUNK_OVERLAP", default_value_t = DEFAULT_CHUNK_OVERLAP)]
    pub chunk_overlap: usize,

    #[arg(long, env = "DOCQA_CHUNK_STRATEGY", value_enum, default_value_t = ChunkStrategy::Recursive)]
    pub chunk_strategy: ChunkStrategy,

    /// Number of chunks placed in the prompt.
    #[arg(long, env = "DOCQA_TOP_K", default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Drop retrieved chunks scoring below this cosine similarity.
    #[arg(long, env = "DOCQA_SIMILARITY_THRESHOLD", default_value_t = NO_THRESHOLD, allow_negative_numbers = true)]
    pub similarity_threshold: f32,

    /// Re-embed every document even if the persisted index is current.
    #[arg(long, env = "DOCQA_REBUILD")]
    pub rebuild: bool,
}

impl ServiceConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn rag_config(&self) -> anyhow::Result<RagConfig> {
        RagConfig::builder()
            .chunk_size(self.chunk_size)
            .chunk_overlap(self.chunk_overlap)
            .top_k(self.top_k)
            .similarity_threshold(self.similarity_threshold)
            .build()
            .context("invalid retrieval settings")
    }

    pub fn chunker(&self) -> Arc<dyn Chunker> {
        match self.chunk_strategy {
            ChunkStrategy::Recursive => {
                Arc::new(RecursiveChunker::new(self.chunk_size, self.chunk_overlap))
            }
            ChunkStrategy::Fixed => {
                Arc::new(FixedSizeChunker::new(self.chunk_size, self.chunk_overlap))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_local_setup() {
        let config = ServiceConfig::try_parse_from(["docqa"]).unwrap();
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:8000");
        assert_eq!(config.documents_dir, PathBuf::from("./documents"));
        assert_eq!(config.index_dir, PathBuf::from("./chroma_db"));
        assert_eq!(config.pattern, "**/*.txt");
        assert_eq!(config.cors_origin, "http://localhost:5173");
        assert_eq!(config.embedding_model, "llama2");
        assert_eq!(config.chunk_strategy, ChunkStrategy::Recursive);
        assert!(!config.rebuild);

        let rag = config.rag_config().unwrap();
        assert_eq!((rag.chunk_size, rag.chunk_overlap, rag.top_k), (1000, 200, 3));
    }

    #[test]
    fn flags_override_defaults() {
        let config = ServiceConfig::try_parse_from([
            "docqa",
            "--port",
            "9000",
            "--chunk-strategy",
            "fixed",
            "--similarity-threshold",
            "-0.5",
            "--rebuild",
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.chunk_strategy, ChunkStrategy::Fixed);
        assert_eq!(config.similarity_threshold, -0.5);
        assert!(config.rebuild);
    }

    #[test]
    fn overlap_not_smaller_than_size_is_rejected() {
        let config = ServiceConfig::try_parse_from([
            "docqa",
            "--chunk-size",
            "100",
            "--chunk-overlap",
            "100",
        ])
        .unwrap();
        assert!(config.rag_config().is_err());
    }
}
