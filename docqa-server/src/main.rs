use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use clap::Parser;
use docqa_rag::{
    FileVectorStore, OllamaConfig, OllamaEmbeddingProvider, OllamaGenerationProvider, RagPipeline,
};
use docqa_server::{AppState, ServiceConfig, run_server, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ServiceConfig::parse();
    telemetry::init_tracing();

    let addr = config.socket_addr()?;
    let allowed_origin = HeaderValue::from_str(&config.cors_origin)
        .with_context(|| format!("invalid CORS origin {:?}", config.cors_origin))?;

    let embedder = OllamaEmbeddingProvider::new(
        OllamaConfig::new(&config.embedding_model)
            .with_base_url(&config.ollama_url)
            .with_timeout(config.timeout()),
    )?;
    let generator = OllamaGenerationProvider::new(
        OllamaConfig::new(&config.generation_model)
            .with_base_url(&config.ollama_url)
            .with_timeout(config.timeout()),
    )?;
    let store = FileVectorStore::open(&config.index_dir)
        .await
        .with_context(|| format!("failed to open index at {}", config.index_dir.display()))?;

    let pipeline = RagPipeline::builder()
        .config(config.rag_config()?)
        .embedding_provider(Arc::new(embedder))
        .generation_provider(Arc::new(generator))
        .vector_store(Arc::new(store))
        .chunker(config.chunker())
        .build()?;

    let report = pipeline
        .initialize_from_dir(&config.collection, &config.documents_dir, &config.pattern, config.rebuild)
        .await
        .with_context(|| {
            format!("failed to index documents in {}", config.documents_dir.display())
        })?;
    info!(
        documents = report.documents,
        chunks = report.chunks,
        reused = report.reused,
        "index ready"
    );

    let state = AppState::new(Arc::new(pipeline), config.collection.as_str());
    run_server(state, addr, allowed_origin).await
}
