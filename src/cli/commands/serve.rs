//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for ingestion, search, RAG queries and session history.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::RagChatError;
use crate::memory::ChatTurn;
use crate::orchestrator::{IngestReport, Orchestrator};
use crate::session::SessionContext;
use crate::vector_store::SearchHit;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Serve, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let state = Arc::new(AppState { orchestrator });

    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("ragchat API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("New session", "POST   /sessions");
    Output::kv("Ask (RAG)", "POST   /ask");
    Output::kv("Search", "POST   /search");
    Output::kv("Ingest", "POST   /ingest");
    Output::kv("History", "GET    /sessions/{user_id}/{session_id}/history");
    Output::kv("Clear", "DELETE /sessions/{user_id}/{session_id}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(new_session))
        .route("/ask", post(ask))
        .route("/search", post(search))
        .route("/ingest", post(ingest))
        .route("/sessions/{user_id}/{session_id}/history", get(history))
        .route("/sessions/{user_id}/{session_id}", delete(clear))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AskRequest {
    query: String,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    sources: Vec<SearchHit>,
    user_id: String,
    session_id: String,
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct IngestRequest {
    path: String,
}

#[derive(Deserialize)]
struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    limit: usize,
}

fn default_history_limit() -> usize {
    20
}

#[derive(Serialize)]
struct HistoryResponse {
    user_id: String,
    session_id: String,
    turns: Vec<ChatTurn>,
}

#[derive(Serialize)]
struct ClearResponse {
    cleared: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    removed: Option<usize>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// A library error on its way to an HTTP response.
struct ApiError(RagChatError);

impl From<RagChatError> for ApiError {
    fn from(err: RagChatError) -> Self {
        Self(err)
    }
}

/// HTTP status for a library error.
fn status_for(err: &RagChatError) -> StatusCode {
    match err {
        RagChatError::IndexMissing { .. } | RagChatError::EmbeddingModelMismatch { .. } => StatusCode::CONFLICT,
        RagChatError::InvalidInput(_) | RagChatError::DocumentLoad { .. } => StatusCode::BAD_REQUEST,
        RagChatError::Provider { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            warn!("Request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn new_session() -> Json<SessionContext> {
    Json(SessionContext::new())
}

async fn ask(State(state): State<Arc<AppState>>, Json(req): Json<AskRequest>) -> ApiResult<AskResponse> {
    let session = SessionContext::resolve(req.user_id, req.session_id);
    let answer = state.orchestrator.answer(&req.query, &session).await?;

    Ok(Json(AskResponse {
        answer: answer.answer,
        sources: answer.sources,
        user_id: session.user_id,
        session_id: session.session_id,
    }))
}

async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> ApiResult<SearchResponse> {
    let limit = req
        .limit
        .unwrap_or(state.orchestrator.settings().rag.top_k);
    let results = state.orchestrator.search(&req.query, limit).await?;
    Ok(Json(SearchResponse { results }))
}

async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IngestRequest>,
) -> ApiResult<IngestReport> {
    if req.path.trim().is_empty() {
        return Err(RagChatError::InvalidInput("path must not be empty".to_string()).into());
    }
    let path = Settings::expand_path(&req.path);
    let report = state.orchestrator.ingest_path(&path).await?;
    Ok(Json(report))
}

async fn history(
    State(state): State<Arc<AppState>>,
    Path((user_id, session_id)): Path<(String, String)>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<HistoryResponse> {
    let session = SessionContext::from_ids(user_id, session_id);
    let turns = state.orchestrator.history(&session, query.limit).await?;

    Ok(Json(HistoryResponse {
        user_id: session.user_id,
        session_id: session.session_id,
        turns,
    }))
}

async fn clear(
    State(state): State<Arc<AppState>>,
    Path((user_id, session_id)): Path<(String, String)>,
) -> Json<ClearResponse> {
    let session = SessionContext::from_ids(user_id, session_id);
    let removed = state.orchestrator.clear_history(&session).await;

    Json(ClearResponse {
        cleared: removed.is_some(),
        removed,
    })
}
