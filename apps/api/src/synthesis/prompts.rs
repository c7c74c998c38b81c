// Prompts for attribute prompt synthesis.
// The return schema is appended by the formatting rules afterwards, so the
// model is asked for extraction logic only.

use crate::llm_client::prompts::JSON_OBJECT_ONLY;
use crate::synthesis::SynthesisRequest;

const SYNTHESIS_ROLE: &str = "You are an expert prompt engineer for an e-commerce platform. \
    Your task is to write high-quality extraction prompts for product attributes.\n\
    You will be given the name of the attribute, an optional description, and some \
    examples of how prompts were written for similar attributes.\n\n";

const OUTPUT_CONTRACT: &str = "The object has exactly two string keys: \"prompt\" and \"system_role\".";

const SCHEMA_NOTE: &str = "The final return schema is appended to your prompt afterwards. \
    Focus on the extraction logic itself: the steps and criteria for identifying the attribute.";

const FAILED_PROMPT_CLAUSE: &str = "The previous prompt for this attribute FAILED to extract correctly. \
    Study the examples closely and write an IMPROVED, more robust version of the failed prompt below. \
    Rewrite it materially. Do NOT just copy or restate it.";

const CLOSING_INSTRUCTION: &str = "Now, following the patterns in the examples, write the extraction prompt \
    and system role for the new attribute as the JSON object described above.";

/// Builds the system message. The failed-prompt clause appears only when a
/// failed prompt is supplied.
pub fn build_system_prompt(request: &SynthesisRequest) -> String {
    let mut system = String::from(SYNTHESIS_ROLE);
    system.push_str("CRITICAL INSTRUCTIONS:\n");
    system.push_str(&format!("1. {JSON_OBJECT_ONLY} {OUTPUT_CONTRACT}\n"));
    system.push_str(&format!("2. {SCHEMA_NOTE}\n"));

    if let Some(failed) = &request.existing_failed_prompt {
        system.push_str(&format!(
            "3. {FAILED_PROMPT_CLAUSE}\n--- FAILED PROMPT ---\n{failed}\n----------------------\n"
        ));
    }

    system
}

/// Builds the user message: the attribute, its description, then the
/// numbered few-shot examples.
pub fn build_user_prompt(request: &SynthesisRequest) -> String {
    let mut user = format!("Attribute Name: {}\n", request.attribute_name);
    if let Some(description) = request
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
    {
        user.push_str(&format!("Description: {description}\n"));
    }

    user.push_str("\nExamples of prompts for similar attributes:\n");
    for (i, example) in request.examples.iter().enumerate() {
        user.push_str(&format!(
            "\n--- Example {} ---\nAttribute: {}\nSystem Role: {}\nPrompt Setup:\n{}\n",
            i + 1,
            example.attribute_name,
            example.system_role,
            example.prompt_text
        ));
    }

    user.push('\n');
    user.push_str(CLOSING_INSTRUCTION);
    user
}
