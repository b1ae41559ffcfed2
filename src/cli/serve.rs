//! HTTP API server for the backend that calls ytrag.
//!
//! One orchestrator, and therefore one video cache, is shared by every
//! request for the life of the server.

use crate::cli::Output;
use crate::orchestrator::{ClearTarget, Orchestrator};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Build the API router around an orchestrator.
pub fn router(orchestrator: Orchestrator) -> Router {
    let state = Arc::new(AppState { orchestrator });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/ask-rag", post(ask_rag))
        .route("/clear-cache", post(clear_cache))
        .route("/cache", get(list_cache))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server until Ctrl+C.
pub async fn run_serve(host: &str, port: u16, orchestrator: Orchestrator) -> anyhow::Result<()> {
    let app = router(orchestrator);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("ytrag API Server");
    Output::success(&format!("Listening on http://{}", addr));
    Output::kv("Health", "GET  /health");
    Output::kv("Ask (RAG)", "POST /ask-rag");
    Output::kv("Clear cache", "POST /clear-cache");
    Output::kv("Cached videos", "GET  /cache");
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AskRagRequest {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    video_context: Option<VideoContext>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoContext {
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClearCacheRequest {
    #[serde(default)]
    video_id: Option<String>,
    #[serde(default)]
    clear_all: bool,
}

#[derive(Serialize)]
struct TextResponse {
    response: String,
}

#[derive(Serialize)]
struct CacheListResponse {
    videos: Vec<String>,
    total: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn bad_request(msg: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: msg.to_string(),
        }),
    )
        .into_response()
}

/// Treat missing and blank strings alike.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// === Handlers ===

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "cached_videos": state.orchestrator.cache().len(),
    }))
}

async fn ask_rag(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRagRequest>,
) -> Response {
    let Some(query) = non_blank(req.query) else {
        return bad_request("Query is required.");
    };
    let Some(video_id) = non_blank(req.video_context.and_then(|c| c.video_id)) else {
        return bad_request("Video ID is required in videoContext.");
    };

    info!("Received query for video ID: {}", video_id);
    let response = state.orchestrator.answer(&query, &video_id).await;

    Json(TextResponse { response }).into_response()
}

async fn clear_cache(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ClearCacheRequest>,
) -> Response {
    let target = if req.clear_all {
        ClearTarget::All
    } else if let Some(video_id) = non_blank(req.video_id) {
        ClearTarget::Video(video_id)
    } else {
        return bad_request("Either videoId or clearAll flag is required for clearing cache.");
    };

    let response = state.orchestrator.clear_cache(&target);
    Json(TextResponse { response }).into_response()
}

async fn list_cache(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let videos = state.orchestrator.cache().ids();
    Json(CacheListResponse {
        total: videos.len(),
        videos,
    })
}
