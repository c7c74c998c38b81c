//! Formatting rules: the fixed output contract appended to every prompt.
//!
//! `{allowed_values}` and `{language}` are left as literal placeholders; the
//! extraction service that runs the prompt fills them in.

pub const ALLOWED_VALUES_INSTRUCTION: &str = "Select only from the following allowed values.";
pub const ALLOWED_VALUES_PLACEHOLDER: &str = "\"allowed_values\": {allowed_values}";
pub const STRICT_JSON_DIRECTIVE: &str = "- Strictly return the JSON object only.";
pub const NO_EXTRAS_DIRECTIVE: &str =
    "- Do not include markdown formatting, code blocks, escaped characters or explanations.";

/// Appends, in order: the allowed-values clause (only with fixed values), the
/// JSON output contract keyed by `attribute_name`, and the strict-JSON directive.
/// Total and deterministic.
pub fn apply(base_prompt: &str, attribute_name: &str, has_fixed_values: bool) -> String {
    let mut lines: Vec<String> = vec![base_prompt.to_string()];

    if has_fixed_values {
        lines.push(ALLOWED_VALUES_INSTRUCTION.to_string());
        lines.push(ALLOWED_VALUES_PLACEHOLDER.to_string());
    }

    lines.push(json_contract_line(attribute_name));
    lines.push(STRICT_JSON_DIRECTIVE.to_string());
    lines.push(NO_EXTRAS_DIRECTIVE.to_string());

    lines.join("\n")
}

fn json_contract_line(attribute_name: &str) -> String {
    format!(
        "- return the output in {{language}} language in JSON format {{ \"{attribute_name}\" : <your_classification> }}"
    )
}
