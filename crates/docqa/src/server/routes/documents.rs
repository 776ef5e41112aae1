//! Document listing

use axum::{extract::State, Json};

use crate::server::state::AppState;
use crate::types::DocumentDescriptor;

/// GET /documents - placeholder descriptor plus documents indexed so far
pub async fn list_documents(State(state): State<AppState>) -> Json<Vec<DocumentDescriptor>> {
    Json(state.documents())
}
