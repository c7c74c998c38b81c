use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::state::AppState;

/// GET /health
/// Reports liveness and how many prompts the similarity index holds.
pub async fn health_handler(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let count = state.index.count().await?;
    Ok(Json(json!({
        "status": "ok",
        "db_count": count,
        "index_backend": state.index.backend_name()
    })))
}
