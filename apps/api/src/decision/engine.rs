//! Prompt Decision Engine: picks how each attribute request gets its prompt.
//!
//! Flow: query index (top 3) → exact-match check on the nearest hit →
//!       reuse | rewrite failed prompt | synthesize from neighbours →
//!       formatting rules → one pair per user input mode.
//!
//! The engine suspends only on the index query and the synthesis call and
//! never writes shared state, so an abandoned request leaves nothing behind.

use std::sync::Arc;

use tracing::info;

use crate::decision::formatting;
use crate::errors::AppError;
use crate::index::SimilarityIndex;
use crate::models::attribute::{FewShotExample, SimilarityResult};
use crate::models::generation::{GeneratedPromptPair, GenerationRequest, PromptPair};
use crate::synthesis::{PromptSynthesizer, SynthesisRequest};

/// Neighbours fetched per request. Only the nearest may be an exact match;
/// all of them become few-shot examples.
pub const NEIGHBOUR_COUNT: usize = 3;

/// Holds the two collaborators it reads from. Built once at startup and
/// shared through `AppState`; tests build it with fakes.
#[derive(Clone)]
pub struct PromptDecisionEngine {
    index: Arc<dyn SimilarityIndex>,
    synthesizer: Arc<dyn PromptSynthesizer>,
}

impl PromptDecisionEngine {
    pub fn new(index: Arc<dyn SimilarityIndex>, synthesizer: Arc<dyn PromptSynthesizer>) -> Self {
        Self { index, synthesizer }
    }

    /// Produces the two formatted prompt pairs for one request.
    ///
    /// Fails with `AppError::Upstream` when the index query fails and
    /// `AppError::Synthesis` when the synthesizer fails. Neither is retried.
    pub async fn decide(
        &self,
        request: &GenerationRequest,
    ) -> Result<[GeneratedPromptPair; 2], AppError> {
        // Step 1: nearest neighbours by attribute name
        let mut neighbours = self
            .index
            .query(&request.attribute_name, NEIGHBOUR_COUNT)
            .await?;
        neighbours.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        // Step 2–3: exact-match check, nearest hit only
        let mut existing_failed_prompt = None;
        if let Some(best) = neighbours
            .first()
            .filter(|best| best.matches_name(&request.attribute_name))
        {
            if !request.has_failed {
                info!(
                    "Exact match found for {}. Bypassing prompt synthesis.",
                    request.attribute_name
                );
                let pair = PromptPair {
                    prompt_text: best.prompt_text.clone(),
                    system_role: best.system_role.clone(),
                };
                return Ok(finish(pair, request));
            }

            info!(
                "Exact match found for {}, but it is marked as failed. Rewriting.",
                request.attribute_name
            );
            existing_failed_prompt = Some(best.prompt_text.clone());
        }

        // Step 4: synthesize from every neighbour retrieved
        let examples = few_shot_examples(neighbours);
        info!("Found {} similar attributes.", examples.len());

        let synthesis_request = SynthesisRequest {
            attribute_name: request.attribute_name.clone(),
            description: request.description.clone(),
            examples,
            existing_failed_prompt,
        };
        let pair = self.synthesizer.synthesize(&synthesis_request).await?;

        // Step 5–6: formatting, then one pair per input mode
        Ok(finish(pair, request))
    }
}

fn few_shot_examples(neighbours: Vec<SimilarityResult>) -> Vec<FewShotExample> {
    neighbours
        .into_iter()
        .take(NEIGHBOUR_COUNT)
        .map(FewShotExample::from)
        .collect()
}

fn finish(pair: PromptPair, request: &GenerationRequest) -> [GeneratedPromptPair; 2] {
    let formatted = PromptPair {
        prompt_text: formatting::apply(
            &pair.prompt_text,
            &request.attribute_name,
            request.has_fixed_values,
        ),
        system_role: pair.system_role,
    };
    GeneratedPromptPair::for_all_modes(formatted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::formatting::{
        ALLOWED_VALUES_PLACEHOLDER, NO_EXTRAS_DIRECTIVE, STRICT_JSON_DIRECTIVE,
    };
    use crate::index::InMemoryIndex;
    use crate::models::attribute::AttributeRecord;
    use crate::models::generation::UserInputMode;
    use crate::synthesis::SynthesisError;
    use crate::test_support::{
        FailingIndex, FailingSynthesizer, FixedIndex, RecordingSynthesizer,
    };

    fn request(name: &str, has_failed: bool, has_fixed_values: bool) -> GenerationRequest {
        GenerationRequest {
            attribute_name: name.to_string(),
            description: None,
            has_fixed_values,
            has_failed,
        }
    }

    async fn fragrance_index() -> Arc<InMemoryIndex> {
        let index = Arc::new(InMemoryIndex::new());
        index
            .upsert(&[
                AttributeRecord {
                    attribute_name: "heart_notes".to_string(),
                    prompt_text: "Identify...".to_string(),
                    system_role: "fragrance_expert".to_string(),
                    source_id: "1".to_string(),
                },
                AttributeRecord {
                    attribute_name: "top_notes".to_string(),
                    prompt_text: "List the top notes.".to_string(),
                    system_role: "perfumer".to_string(),
                    source_id: "2".to_string(),
                },
            ])
            .await
            .unwrap();
        index
    }

    fn assert_pair_invariants(pairs: &[GeneratedPromptPair; 2]) {
        assert_eq!(pairs[0].prompt_text, pairs[1].prompt_text);
        assert_eq!(pairs[0].system_role, pairs[1].system_role);
        assert_eq!(pairs[0].user_input_mode, UserInputMode::AllImages);
        assert_eq!(pairs[1].user_input_mode, UserInputMode::None);
        assert!(pairs[0].prompt_text.ends_with(NO_EXTRAS_DIRECTIVE));
        assert!(pairs[0].prompt_text.contains(STRICT_JSON_DIRECTIVE));
    }

    #[tokio::test]
    async fn test_exact_match_reuses_stored_prompt_without_synthesis() {
        let synthesizer = Arc::new(RecordingSynthesizer::new("unused", "unused"));
        let engine = PromptDecisionEngine::new(fragrance_index().await, synthesizer.clone());

        let pairs = engine
            .decide(&request("Heart_Notes", false, false))
            .await
            .unwrap();

        assert!(synthesizer.calls().is_empty());
        assert_pair_invariants(&pairs);
        assert_eq!(pairs[0].system_role, "fragrance_expert");
        assert_eq!(
            pairs[0].prompt_text,
            formatting::apply("Identify...", "Heart_Notes", false)
        );
    }

    #[tokio::test]
    async fn test_failed_exact_match_is_rewritten() {
        let synthesizer = Arc::new(RecordingSynthesizer::new(
            "Identify the heart notes step by step.",
            "fragrance_expert",
        ));
        let engine = PromptDecisionEngine::new(fragrance_index().await, synthesizer.clone());

        let pairs = engine
            .decide(&request("heart_notes", true, false))
            .await
            .unwrap();

        let calls = synthesizer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].existing_failed_prompt.as_deref(), Some("Identify..."));
        assert_eq!(calls[0].examples[0].attribute_name, "heart_notes");
        assert_pair_invariants(&pairs);
        assert!(pairs[0]
            .prompt_text
            .starts_with("Identify the heart notes step by step."));
        assert_ne!(pairs[0].prompt_text, "Identify...");
    }

    #[tokio::test]
    async fn test_empty_index_synthesizes_with_no_examples() {
        let synthesizer = Arc::new(RecordingSynthesizer::new("Read the spec sheet.", "tech"));
        let engine =
            PromptDecisionEngine::new(Arc::new(InMemoryIndex::new()), synthesizer.clone());

        let pairs = engine
            .decide(&request("screen_resolution", false, true))
            .await
            .unwrap();

        let calls = synthesizer.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].examples.is_empty());
        assert_eq!(calls[0].existing_failed_prompt, None);
        assert_pair_invariants(&pairs);
        assert!(pairs[0].prompt_text.contains(ALLOWED_VALUES_PLACEHOLDER));
        assert_eq!(pairs[0].system_role, "tech");
    }

    #[tokio::test]
    async fn test_no_exact_match_uses_all_neighbours_as_examples() {
        let synthesizer = Arc::new(RecordingSynthesizer::new("New prompt.", "perfumer"));
        let engine = PromptDecisionEngine::new(fragrance_index().await, synthesizer.clone());

        engine
            .decide(&request("base_notes", false, false))
            .await
            .unwrap();

        let calls = synthesizer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].examples.len(), 2);
        assert_eq!(calls[0].existing_failed_prompt, None);
        assert!(calls[0]
            .examples
            .windows(2)
            .all(|w| w[0].distance <= w[1].distance));
    }

    #[tokio::test]
    async fn test_failed_flag_without_exact_match_synthesizes_fresh() {
        let synthesizer = Arc::new(RecordingSynthesizer::new("New prompt.", "perfumer"));
        let engine = PromptDecisionEngine::new(fragrance_index().await, synthesizer.clone());

        let pairs = engine
            .decide(&request("base_notes", true, false))
            .await
            .unwrap();

        let calls = synthesizer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].existing_failed_prompt, None);
        assert_eq!(calls[0].examples.len(), 2);
        assert!(pairs[0].prompt_text.starts_with("New prompt."));
    }

    #[tokio::test]
    async fn test_exact_match_beats_punctuation_variant_at_same_distance() {
        let index = Arc::new(InMemoryIndex::new());
        index
            .upsert(&[
                AttributeRecord {
                    attribute_name: "Heart-Notes".to_string(),
                    prompt_text: "variant".to_string(),
                    system_role: "x".to_string(),
                    source_id: "1".to_string(),
                },
                AttributeRecord {
                    attribute_name: "heart_notes".to_string(),
                    prompt_text: "Identify...".to_string(),
                    system_role: "fragrance_expert".to_string(),
                    source_id: "2".to_string(),
                },
            ])
            .await
            .unwrap();
        let synthesizer = Arc::new(RecordingSynthesizer::new("unused", "unused"));
        let engine = PromptDecisionEngine::new(index, synthesizer.clone());

        let pairs = engine
            .decide(&request("heart_notes", false, false))
            .await
            .unwrap();

        assert!(synthesizer.calls().is_empty());
        assert_eq!(pairs[0].system_role, "fragrance_expert");
        assert!(pairs[0].prompt_text.starts_with("Identify..."));
    }

    #[tokio::test]
    async fn test_only_nearest_neighbour_can_be_exact() {
        // The matching name is present but a different name is strictly nearer.
        let hit = |name: &str, prompt: &str, distance: f64| SimilarityResult {
            attribute_name: name.to_string(),
            prompt_text: prompt.to_string(),
            system_role: "r".to_string(),
            distance,
        };
        let index = Arc::new(FixedIndex(vec![
            hit("heart_notez", "near miss", 0.1),
            hit("heart_notes", "exact", 0.3),
        ]));
        let synthesizer = Arc::new(RecordingSynthesizer::new("Synthesized.", "r"));
        let engine = PromptDecisionEngine::new(index, synthesizer.clone());

        let pairs = engine
            .decide(&request("heart_notes", false, false))
            .await
            .unwrap();

        let calls = synthesizer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].examples.len(), 2);
        assert_eq!(calls[0].examples[0].attribute_name, "heart_notez");
        assert_eq!(calls[0].existing_failed_prompt, None);
        assert!(pairs[0].prompt_text.starts_with("Synthesized."));
    }

    #[tokio::test]
    async fn test_index_failure_is_upstream_error() {
        let synthesizer = Arc::new(RecordingSynthesizer::new("unused", "unused"));
        let engine = PromptDecisionEngine::new(Arc::new(FailingIndex), synthesizer.clone());

        let err = engine
            .decide(&request("heart_notes", false, false))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Upstream(_)));
        assert!(synthesizer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_synthesis_failure_propagates() {
        let engine = PromptDecisionEngine::new(
            Arc::new(InMemoryIndex::new()),
            Arc::new(FailingSynthesizer),
        );

        let err = engine
            .decide(&request("heart_notes", false, false))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Synthesis(SynthesisError::Malformed(_))
        ));
    }
}
