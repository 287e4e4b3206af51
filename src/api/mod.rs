//! REST API module using Axum
//!
//! Health-check surface for the knowledge pipeline. The retrieval and
//! ingestion paths are CLI-driven; the HTTP side exposes only
//! `GET /status` for deployment probes.

use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

/// `GET /status` liveness probe.
async fn status() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Build the application router.
pub fn create_app() -> Router {
    Router::new()
        .route("/status", get(status))
        .layer(TraceLayer::new_for_http())
}
