//! HTTP routes for the Q&A server

pub mod chat;
pub mod documents;
pub mod run;

use axum::{
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;

/// Build the service routes
pub fn service_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/documents", get(documents::list_documents))
        .route("/chat/", post(chat::chat))
        .route("/chat", post(chat::chat))
        .route("/hackrx/run", post(run::hackrx_run))
}

/// GET / - liveness and service info
async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "docqa",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
