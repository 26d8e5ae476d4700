//! JSON HTTP server for the knowledge base.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version and backends) |
//! | `GET`    | `/documents` | List all documents |
//! | `POST`   | `/documents` | Add a document (`?wait=false` returns before indexing finishes) |
//! | `GET`    | `/documents/{id}` | Fetch one document |
//! | `DELETE` | `/documents/{id}` | Remove a document (idempotent, always `204`) |
//! | `POST`   | `/documents/{id}/cancel` | Cancel in-flight indexing |
//! | `POST`   | `/context` | Retrieve and format context for a query |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "title must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404),
//! `indexing_failed` (422), `internal` (500).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rag_context_core::{KnowledgeDocument, NewDocument, RagError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::config::Config;
use crate::knowledge::{ContextBlock, KnowledgeBase};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    kb: Arc<KnowledgeBase>,
}

/// Build the router. Exposed separately from [`run_server`] so tests and
/// embedders can bind their own listener.
pub fn router(kb: Arc<KnowledgeBase>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/documents", get(handle_list).post(handle_add))
        .route("/documents/{id}", get(handle_get).delete(handle_remove))
        .route("/documents/{id}/cancel", post(handle_cancel))
        .route("/context", post(handle_context))
        .layer(cors)
        .with_state(AppState { kb })
}

/// Bind to `[server].bind` and serve until the process is terminated.
pub async fn run_server(config: &Config, kb: Arc<KnowledgeBase>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(kb);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Knowledge base server listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<RagError> for AppError {
    fn from(err: RagError) -> Self {
        let message = err.to_string();
        let (status, code) = match err {
            RagError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            RagError::InvalidDocument(_) | RagError::InvalidTemplate(_) => {
                (StatusCode::BAD_REQUEST, "bad_request")
            }
            RagError::IndexingFailed { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "indexing_failed"),
            RagError::Backend(_) => {
                error!(error = %message, "Knowledge base backend error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };
        AppError {
            status,
            code,
            message,
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    retriever: String,
    indexer: String,
    pending_indexing: usize,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        retriever: state.kb.retriever_name().to_string(),
        indexer: state.kb.indexer_name().to_string(),
        pending_indexing: state.kb.pending_indexing(),
    })
}

// ============ /documents ============

#[derive(Serialize)]
struct DocumentListResponse {
    documents: Vec<KnowledgeDocument>,
}

async fn handle_list(State(state): State<AppState>) -> Result<Json<DocumentListResponse>, AppError> {
    let documents = state.kb.get_documents().await?;
    Ok(Json(DocumentListResponse { documents }))
}

#[derive(Deserialize)]
struct AddParams {
    #[serde(default = "default_wait")]
    wait: bool,
}

fn default_wait() -> bool {
    true
}

/// `201` with the indexed document, or `202` with the `processing`
/// document when `wait=false`.
async fn handle_add(
    State(state): State<AppState>,
    Query(params): Query<AddParams>,
    Json(new): Json<NewDocument>,
) -> Result<(StatusCode, Json<KnowledgeDocument>), AppError> {
    if params.wait {
        let doc = state.kb.add_document(new).await?;
        return Ok((StatusCode::CREATED, Json(doc)));
    }

    let handle = state.kb.submit_document(new).await?;
    let doc = state
        .kb
        .get_document(handle.id())
        .await?
        .ok_or_else(|| RagError::NotFound(handle.id().to_string()))?;
    Ok((StatusCode::ACCEPTED, Json(doc)))
}

async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<KnowledgeDocument>, AppError> {
    let doc = state
        .kb
        .get_document(&id)
        .await?
        .ok_or(RagError::NotFound(id))?;
    Ok(Json(doc))
}

async fn handle_remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.kb.remove_document(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
struct CancelResponse {
    cancelled: bool,
}

async fn handle_cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CancelResponse>, AppError> {
    let cancelled = state.kb.cancel_indexing(&id).await?;
    Ok(Json(CancelResponse { cancelled }))
}

// ============ POST /context ============

#[derive(Deserialize)]
struct ContextRequest {
    query: String,
    #[serde(default)]
    limit: Option<usize>,
}

async fn handle_context(
    State(state): State<AppState>,
    Json(req): Json<ContextRequest>,
) -> Result<Json<ContextBlock>, AppError> {
    let block = state.kb.build_context(&req.query, req.limit).await?;
    Ok(Json(block))
}
