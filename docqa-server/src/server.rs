use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use docqa_rag::{RagError, RagPipeline};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared handler state: one pipeline for the whole process.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
    pub collection: Arc<str>,
}

impl AppState {
    pub fn new(pipeline: Arc<RagPipeline>, collection: impl Into<Arc<str>>) -> Self {
        Self { pipeline, collection: collection.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
}

/// A pipeline failure rendered as `{"detail", "kind"}`.
#[derive(Debug)]
pub struct ApiError(pub RagError);

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            warn!(kind = self.0.kind(), error = %self.0, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = json!({"detail": self.0.to_string(), "kind": self.0.kind()});
        (status, Json(body)).into_response()
    }
}

/// Routes plus CORS for a single browser origin that may send credentials.
pub fn app_router(state: AppState, allowed_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::exact(allowed_origin))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Router::new()
        .route("/query", post(query))
        .route("/health", get(health))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(
    state: AppState,
    addr: SocketAddr,
    allowed_origin: HeaderValue,
) -> anyhow::Result<()> {
    let app = app_router(state, allowed_origin);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("docqa listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let answer = state.pipeline.answer(&state.collection, &request.query).await?;
    Ok(Json(QueryResponse { answer: answer.text }))
}

async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let chunks = state.pipeline.vector_store().count(&state.collection).await?.unwrap_or(0);
    Ok(Json(json!({"status": "ok", "service": "docqa", "chunks": chunks})))
}
