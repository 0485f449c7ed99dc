//! Error types for the `docqa-rag` crate.

use thiserror::Error;

/// Errors that can occur while building the index or answering a query.
///
/// Every variant maps to a stable tag returned by [`RagError::kind`], so the
/// HTTP layer can tell client mistakes apart from provider failures.
#[derive(Debug, Error)]
pub enum RagError {
    /// The caller supplied invalid input (for example an empty query).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A model provider could not be reached at all (connection refused, timeout).
    #[error("Provider unavailable ({provider}): {message}")]
    ProviderUnavailable {
        /// The provider that could not be reached.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The generation model returned an error or an unusable response.
    #[error("Generation error ({provider}): {message}")]
    GenerationError {
        /// The generation provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A search produced no chunks to build a prompt from.
    #[error("No relevant documents found in collection '{collection}'")]
    RetrievalEmpty {
        /// The collection that was searched.
        collection: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// Reading or writing the on-disk index failed.
    #[error("Persistence error ({path}): {message}")]
    PersistenceError {
        /// The file or directory involved.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// Source documents could not be loaded.
    #[error("Loader error: {0}")]
    LoaderError(String),

    /// An error occurred during document chunking.
    #[error("Chunking error: {0}")]
    ChunkingError(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in the RAG pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

impl RagError {
    /// Stable, machine-readable tag for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ValidationError(_) => "validation",
            Self::ProviderUnavailable { .. } => "provider_unavailable",
            Self::EmbeddingError { .. } => "embedding_failure",
            Self::GenerationError { .. } => "generation_failure",
            Self::RetrievalEmpty { .. } => "retrieval_empty",
            Self::VectorStoreError { .. } => "vector_store_failure",
            Self::PersistenceError { .. } => "persistence_failure",
            Self::LoaderError(_) => "loader_failure",
            Self::ChunkingError(_) => "chunking_failure",
            Self::ConfigError(_) => "config",
            Self::PipelineError(_) => "pipeline_failure",
        }
    }

    /// Whether the caller may reasonably retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ProviderUnavailable { .. })
    }

    /// Whether the error was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ValidationError(_))
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_provider_unavailable_is_retryable() {
        let unavailable = RagError::ProviderUnavailable {
            provider: "Ollama".into(),
            message: "connection refused".into(),
        };
        let generation =
            RagError::GenerationError { provider: "Ollama".into(), message: "boom".into() };

        assert!(unavailable.is_retryable());
        assert!(!generation.is_retryable());
        assert!(!RagError::ValidationError("empty".into()).is_retryable());
    }

    #[test]
    fn kinds_are_distinct_for_request_errors() {
        let errors = [
            RagError::ValidationError("x".into()),
            RagError::ProviderUnavailable { provider: "p".into(), message: "m".into() },
            RagError::RetrievalEmpty { collection: "docs".into() },
            RagError::GenerationError { provider: "p".into(), message: "m".into() },
        ];
        let kinds: Vec<_> = errors.iter().map(RagError::kind).collect();
        assert_eq!(
            kinds,
            ["validation", "provider_unavailable", "retrieval_empty", "generation_failure"]
        );
        assert!(errors[0].is_client_error());
        assert!(!errors[1].is_client_error());
    }
}
