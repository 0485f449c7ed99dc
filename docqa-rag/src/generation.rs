//! Generation provider trait for producing answers from a prompt.

use async_trait::async_trait;

use crate::error::Result;

/// A language model that turns a fully assembled prompt into text.
///
/// Calls are single-shot: no streaming and no conversation state.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Identifier of the underlying model.
    fn model_name(&self) -> &str;
}
