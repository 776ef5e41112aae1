//! Batch run endpoint: one document, many questions

use axum::{extract::State, Json};
use std::time::Instant;

use crate::error::Result;
use crate::ingestion::IndexOutcome;
use crate::server::state::AppState;
use crate::types::{RunRequest, RunResponse};

/// POST /hackrx/run - download and index the document, then answer every question
pub async fn hackrx_run(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Result<Json<RunResponse>> {
    let start = Instant::now();
    tracing::info!(
        "Run: {} questions against {}",
        request.questions.len(),
        request.documents
    );

    let outcome = state.pipeline().run(&request).await?;

    if let (Some(document), Some(IndexOutcome::Indexed { .. })) = (&outcome.document, outcome.indexed) {
        state.record_document(document);
    }

    tracing::info!(
        "Run answered {} questions in {:.1}s",
        outcome.answers.len(),
        start.elapsed().as_secs_f32()
    );
    Ok(Json(RunResponse::from(outcome.answers)))
}
