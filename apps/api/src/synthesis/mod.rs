//! Prompt synthesis: writes a new (prompt, system_role) pair for an attribute
//! from few-shot neighbours, or rewrites one that failed.
//!
//! `PromptSynthesizer` is the seam the decision engine depends on; the
//! production implementation is `LlmPromptSynthesizer`.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::{strip_json_fences, LlmClient, LlmError};
use crate::models::attribute::FewShotExample;
use crate::models::generation::PromptPair;

pub mod prompts;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("synthesis backend call failed: {0}")]
    Backend(#[from] LlmError),

    #[error("synthesis backend returned malformed output: {0}")]
    Malformed(String),
}

/// Everything the synthesizer is told about the attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub attribute_name: String,
    pub description: Option<String>,
    pub examples: Vec<FewShotExample>,
    /// Set when the stored prompt for this attribute failed and must be rewritten.
    pub existing_failed_prompt: Option<String>,
}

#[async_trait]
pub trait PromptSynthesizer: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<PromptPair, SynthesisError>;
}

/// Result of reading a completion as a prompt pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisOutcome {
    Generated(PromptPair),
    Malformed { reason: String },
}

#[derive(Deserialize)]
struct RawPair {
    prompt: Option<serde_json::Value>,
    system_role: Option<serde_json::Value>,
}

impl SynthesisOutcome {
    /// Reads a completion body. It must be a JSON object with a non-empty
    /// string `prompt` and a string `system_role`; anything else is malformed.
    pub fn from_completion(text: &str) -> Self {
        let raw: RawPair = match serde_json::from_str(strip_json_fences(text)) {
            Ok(raw) => raw,
            Err(e) => {
                return SynthesisOutcome::Malformed {
                    reason: format!("not a JSON object: {e}"),
                }
            }
        };

        let prompt = match raw.prompt {
            Some(serde_json::Value::String(p)) if !p.trim().is_empty() => p,
            Some(serde_json::Value::String(_)) => {
                return SynthesisOutcome::Malformed {
                    reason: "\"prompt\" is empty".to_string(),
                }
            }
            Some(_) => {
                return SynthesisOutcome::Malformed {
                    reason: "\"prompt\" is not a string".to_string(),
                }
            }
            None => {
                return SynthesisOutcome::Malformed {
                    reason: "missing \"prompt\"".to_string(),
                }
            }
        };

        let system_role = match raw.system_role {
            Some(serde_json::Value::String(r)) => r,
            Some(_) => {
                return SynthesisOutcome::Malformed {
                    reason: "\"system_role\" is not a string".to_string(),
                }
            }
            None => {
                return SynthesisOutcome::Malformed {
                    reason: "missing \"system_role\"".to_string(),
                }
            }
        };

        SynthesisOutcome::Generated(PromptPair {
            prompt_text: prompt,
            system_role,
        })
    }
}

/// Synthesizer backed by the chat-completions deployment.
#[derive(Clone)]
pub struct LlmPromptSynthesizer {
    llm: LlmClient,
}

impl LlmPromptSynthesizer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl PromptSynthesizer for LlmPromptSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<PromptPair, SynthesisError> {
        let system = prompts::build_system_prompt(request);
        let user = prompts::build_user_prompt(request);

        info!(
            "Synthesizing prompt for {} with {} examples (rewrite: {})",
            request.attribute_name,
            request.examples.len(),
            request.existing_failed_prompt.is_some()
        );

        let text = self.llm.call_text(&user, &system).await?;

        match SynthesisOutcome::from_completion(&text) {
            SynthesisOutcome::Generated(pair) => Ok(pair),
            SynthesisOutcome::Malformed { reason } => {
                warn!("Discarding malformed synthesis output: {reason}");
                Err(SynthesisError::Malformed(reason))
            }
        }
    }
}
