//! Deterministic providers shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use docqa_rag::{
    Chunker, EmbeddingProvider, GenerationProvider, RagConfig, RagError, RagPipeline,
    RecursiveChunker, VectorStore,
};

/// Hashes lowercase words into a fixed number of buckets. Counts are
/// non-negative, so identical texts score 1.0 and unrelated texts score >= 0.
pub struct BagOfWordsEmbedder {
    dimensions: usize,
    calls: AtomicUsize,
}

impl BagOfWordsEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for BagOfWordsEmbedder {
    async fn embed(&self, text: &str) -> docqa_rag::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut emb = vec![0.0f32; self.dimensions];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            emb[(hash % self.dimensions as u64) as usize] += 1.0;
        }
        Ok(emb)
    }

    fn model_name(&self) -> &str {
        "bag-of-words"
    }
}

/// Shares the bag-of-words model name but the provider is down.
pub struct UnreachableEmbedder;

#[async_trait]
impl EmbeddingProvider for UnreachableEmbedder {
    async fn embed(&self, _text: &str) -> docqa_rag::Result<Vec<f32>> {
        Err(RagError::ProviderUnavailable {
            provider: "test".to_string(),
            message: "connection refused".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "bag-of-words"
    }
}

/// Returns a fixed answer and remembers the last prompt it saw.
pub struct StaticGenerator {
    answer: String,
    last_prompt: Mutex<Option<String>>,
}

impl StaticGenerator {
    pub fn new(answer: &str) -> Self {
        Self { answer: answer.to_string(), last_prompt: Mutex::new(None) }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationProvider for StaticGenerator {
    async fn generate(&self, prompt: &str) -> docqa_rag::Result<String> {
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        Ok(format!("  {}\n", self.answer))
    }

    fn model_name(&self) -> &str {
        "static"
    }
}

/// Always fails as if the model server were down.
pub struct UnreachableGenerator;

#[async_trait]
impl GenerationProvider for UnreachableGenerator {
    async fn generate(&self, _prompt: &str) -> docqa_rag::Result<String> {
        Err(RagError::ProviderUnavailable {
            provider: "test".to_string(),
            message: "connection refused".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "unreachable"
    }
}

pub fn pipeline(
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    store: Arc<dyn VectorStore>,
) -> RagPipeline {
    let chunker = Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap));
    pipeline_with_chunker(config, embedder, generator, store, chunker)
}

pub fn pipeline_with_chunker(
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
) -> RagPipeline {
    RagPipeline::builder()
        .config(config)
        .embedding_provider(embedder)
        .generation_provider(generator)
        .vector_store(store)
        .chunker(chunker)
        .build()
        .unwrap()
}
