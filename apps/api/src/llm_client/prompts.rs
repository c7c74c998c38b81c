// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it;
// this file holds only the pieces every JSON-mode call repeats.

/// Output rule for calls made in JSON-object mode.
pub const JSON_OBJECT_ONLY: &str =
    "Output exactly one JSON object. Do not wrap it in markdown blocks like ```json. \
    Do not add any text before or after the object.";
