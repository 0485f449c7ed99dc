//! Ollama providers against a loopback server speaking the Ollama REST API.

use axum::{Json, Router, http::StatusCode, routing::post};
use docqa_rag::{
    EmbeddingProvider, GenerationProvider, OllamaConfig, OllamaEmbeddingProvider,
    OllamaGenerationProvider, RagError,
};
use serde_json::{Value, json};

async fn fake_embed(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["model"] == "missing" {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "model 'missing' not found"})));
    }
    let inputs = body["input"].as_array().cloned().unwrap_or_default();
    let embeddings: Vec<Value> = inputs
        .iter()
        .map(|text| {
            let len = text.as_str().map(str::len).unwrap_or(0) as f32;
            json!([len, 1.0, 0.0])
        })
        .collect();
    (StatusCode::OK, Json(json!({"model": body["model"], "embeddings": embeddings})))
}

async fn fake_generate(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["stream"] != json!(false) {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "expected stream=false"})));
    }
    if body["model"] == "missing" {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "model 'missing' not found"})));
    }
    let prompt = body["prompt"].as_str().unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({"model": body["model"], "response": format!("echo: {prompt}"), "done": true})),
    )
}

async fn spawn_fake_ollama() -> (String, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route("/api/embed", post(fake_embed))
        .route("/api/generate", post(fake_generate));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind fake ollama");
    let addr = listener.local_addr().expect("listener addr");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake ollama run");
    });
    (format!("http://{addr}"), handle)
}

#[tokio::test]
async fn embeds_batches_in_input_order() {
    let (base, handle) = spawn_fake_ollama().await;
    let provider =
        OllamaEmbeddingProvider::new(OllamaConfig::new("llama2").with_base_url(&base)).unwrap();

    let embeddings = provider.embed_batch(&["a", "abc", "ab"]).await.unwrap();
    assert_eq!(embeddings, vec![vec![1.0, 1.0, 0.0], vec![3.0, 1.0, 0.0], vec![2.0, 1.0, 0.0]]);
    assert_eq!(provider.embed("abcd").await.unwrap(), vec![4.0, 1.0, 0.0]);
    assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
    assert_eq!(provider.model_name(), "llama2");

    handle.abort();
}

#[tokio::test]
async fn generates_without_streaming() {
    let (base, handle) = spawn_fake_ollama().await;
    let provider =
        OllamaGenerationProvider::new(OllamaConfig::new("llama2").with_base_url(&base)).unwrap();

    let answer = provider.generate("What color is the sky?").await.unwrap();
    assert_eq!(answer, "echo: What color is the sky?");

    handle.abort();
}

#[tokio::test]
async fn api_errors_carry_status_and_message() {
    let (base, handle) = spawn_fake_ollama().await;
    let config = OllamaConfig::new("missing").with_base_url(&base);

    let err = OllamaGenerationProvider::new(config.clone()).unwrap().generate("hi").await.unwrap_err();
    assert!(matches!(err, RagError::GenerationError { .. }));
    assert!(err.to_string().contains("404"));
    assert!(err.to_string().contains("model 'missing' not found"));

    let err = OllamaEmbeddingProvider::new(config).unwrap().embed("hi").await.unwrap_err();
    assert!(matches!(err, RagError::EmbeddingError { .. }));
    assert!(!err.is_retryable());

    handle.abort();
}
