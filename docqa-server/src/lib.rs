//! `docqa-server` exposes a [`docqa_rag::RagPipeline`] over HTTP.
//! `POST /query` answers a question from the indexed documents.

pub mod config;
pub mod server;
pub mod telemetry;

pub use config::{ChunkStrategy, ServiceConfig};
pub use server::{ApiError, AppState, QueryRequest, QueryResponse, app_router, run_server};
