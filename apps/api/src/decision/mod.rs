// Prompt decision: reuse, rewrite, or synthesize an extraction prompt.
// All LLM calls go through the synthesis module; nothing here writes to the index.

pub mod engine;
pub mod formatting;
pub mod handlers;
