//! Single-question chat endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{ChatParams, ChatResponse};

/// POST /chat/?question=... - answer from the current index
pub async fn chat(
    State(state): State<AppState>,
    Query(params): Query<ChatParams>,
) -> Result<Json<ChatResponse>> {
    let question = params.question.trim();
    if question.is_empty() {
        return Err(Error::bad_request("Empty question."));
    }

    let start = Instant::now();
    tracing::info!("Chat question: \"{}\"", question);

    let answer = state.pipeline().answer_question(question).await?;
    tracing::info!(
        "Chat answered ({:?}) in {:.1}s",
        answer.status,
        start.elapsed().as_secs_f32()
    );

    Ok(Json(ChatResponse { answer: answer.answer }))
}
