//! Text-to-vector providers.

use async_trait::async_trait;

use crate::error::Result;

/// Turns text into vectors for indexing and for queries.
///
/// Index and queries must go through the same model; vectors from different
/// models are not comparable, which is why the model name is part of the
/// index fingerprint.
///
/// ```rust,ignore
/// let query_vector = provider.embed("What color is the sky?").await?;
/// let chunk_vectors = provider.embed_batch(&["The sky is blue.", "Water is wet."]).await?;
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// One vector per input, in input order. Falls back to one
    /// [`embed`](EmbeddingProvider::embed) call per text.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Recorded in the index manifest.
    fn model_name(&self) -> &str;
}
