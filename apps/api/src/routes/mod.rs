pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::decision::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/generate-prompt", post(handlers::handle_generate_prompt))
        .with_state(state)
}
