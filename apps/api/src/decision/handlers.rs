//! Axum route handler for prompt generation.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::generation::{GeneratedPromptPair, GenerationRequest};
use crate::state::AppState;

/// POST /generate-prompt
///
/// Returns exactly two prompt objects, `user_input` = "all_images" then "None".
/// Bodies that fail to parse or validate never reach the index.
pub async fn handle_generate_prompt(
    State(state): State<AppState>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<[GeneratedPromptPair; 2]>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::UnprocessableEntity(e.body_text()))?;
    request.validate()?;

    let span = info_span!(
        "generate_prompt",
        request_id = %Uuid::new_v4(),
        attribute = %request.attribute_name
    );

    async move {
        info!(
            "Received generation request for attribute: {}",
            request.attribute_name
        );
        let pairs = state.engine.decide(&request).await?;
        Ok(Json(pairs))
    }
    .instrument(span)
    .await
}
