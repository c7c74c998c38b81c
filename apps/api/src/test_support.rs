//! Fakes for the index and synthesizer seams.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::index::{IndexError, SimilarityIndex};
use crate::models::attribute::{AttributeRecord, SimilarityResult};
use crate::models::generation::PromptPair;
use crate::synthesis::{PromptSynthesizer, SynthesisError, SynthesisRequest};

/// Returns a fixed pair and remembers every request it was given.
pub struct RecordingSynthesizer {
    reply: PromptPair,
    calls: Mutex<Vec<SynthesisRequest>>,
}

impl RecordingSynthesizer {
    pub fn new(prompt_text: &str, system_role: &str) -> Self {
        Self {
            reply: PromptPair {
                prompt_text: prompt_text.to_string(),
                system_role: system_role.to_string(),
            },
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<SynthesisRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PromptSynthesizer for RecordingSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<PromptPair, SynthesisError> {
        self.calls.lock().unwrap().push(request.clone());
        Ok(self.reply.clone())
    }
}

pub struct FailingSynthesizer;

#[async_trait]
impl PromptSynthesizer for FailingSynthesizer {
    async fn synthesize(&self, _request: &SynthesisRequest) -> Result<PromptPair, SynthesisError> {
        Err(SynthesisError::Malformed("missing \"prompt\"".to_string()))
    }
}

/// An index whose backend is unreachable.
pub struct FailingIndex;

#[async_trait]
impl SimilarityIndex for FailingIndex {
    async fn upsert(&self, _records: &[AttributeRecord]) -> Result<(), IndexError> {
        Err(IndexError::Unavailable("connection refused".to_string()))
    }

    async fn query(&self, _text: &str, _k: usize) -> Result<Vec<SimilarityResult>, IndexError> {
        Err(IndexError::Unavailable("connection refused".to_string()))
    }

    async fn count(&self) -> Result<usize, IndexError> {
        Err(IndexError::Unavailable("connection refused".to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

/// Returns the same hits for every query, in the order given.
pub struct FixedIndex(pub Vec<SimilarityResult>);

#[async_trait]
impl SimilarityIndex for FixedIndex {
    async fn upsert(&self, _records: &[AttributeRecord]) -> Result<(), IndexError> {
        Ok(())
    }

    async fn query(&self, _text: &str, k: usize) -> Result<Vec<SimilarityResult>, IndexError> {
        Ok(self.0.iter().take(k).cloned().collect())
    }

    async fn count(&self) -> Result<usize, IndexError> {
        Ok(self.0.len())
    }

    fn backend_name(&self) -> &'static str {
        "fixed"
    }
}
