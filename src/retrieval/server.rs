//! HTTP surface of the plan retrieval service.
//!
//! Two endpoints: `POST /search` for semantic plan lookup and
//! `GET /health` for liveness probes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::config::{AegisConfig, RetrievalServerConfig};
use crate::types::{AppError, Result};

use super::embeddings::{EmbeddingClient, create_embedder};
use super::store::PlanStore;
use super::{PLAN_RESULT_COUNT, SearchRequest, SearchResponse};

/// Shared state for the retrieval endpoints.
#[derive(Clone)]
pub struct RetrievalState {
    pub store: Arc<PlanStore>,
    pub embedder: Arc<dyn EmbeddingClient>,
}

impl RetrievalState {
    /// Build state from configuration: embedding backend plus the plan
    /// index snapshot (created empty if missing).
    pub async fn from_config(cfg: &AegisConfig) -> Result<Self> {
        let embedder = create_embedder(&cfg.embeddings)?;
        let store =
            PlanStore::load_or_create(embedder.dimension(), &cfg.retrieval_server.index_path)
                .await?;

        Ok(Self {
            store: Arc::new(store),
            embedder,
        })
    }
}

/// Build the retrieval router.
pub fn router(state: RetrievalState) -> Router {
    Router::new()
        .route("/search", post(search))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind and run the retrieval server until it is shut down.
pub async fn serve(cfg: &RetrievalServerConfig, state: RetrievalState) -> Result<()> {
    let addr = format!("{}:{}", cfg.host, cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("failed to bind {}: {}", addr, e)))?;

    info!(%addr, plans = state.store.len(), "retrieval server listening");

    axum::serve(listener, router(state))
        .await
        .map_err(|e| AppError::Internal(format!("retrieval server error: {}", e)))?;

    Ok(())
}

async fn search(
    State(state): State<RetrievalState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    let embeddings = state
        .embedder
        .embed(std::slice::from_ref(&request.query))
        .await?;
    let query_vector = embeddings.into_iter().next().ok_or_else(|| {
        AppError::Retrieval("embedding backend returned no vector for the query".to_string())
    })?;

    let results = state
        .store
        .search_plans(&query_vector, PLAN_RESULT_COUNT)?;

    Ok(Json(SearchResponse { results }))
}

async fn health(State(state): State<RetrievalState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "plans": state.store.len(),
    }))
}
