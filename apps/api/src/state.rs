use std::sync::Arc;

use crate::decision::engine::PromptDecisionEngine;
use crate::index::SimilarityIndex;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Read by `/health` for the entry count; the engine holds its own handle.
    pub index: Arc<dyn SimilarityIndex>,
    pub engine: PromptDecisionEngine,
}
