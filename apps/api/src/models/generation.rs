use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::AppError;

/// Body of `POST /generate-prompt`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationRequest {
    pub attribute_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub has_fixed_values: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub has_failed: bool,
}

impl GenerationRequest {
    /// Rejects requests the decision engine must never see.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.attribute_name.trim().is_empty() {
            return Err(AppError::Validation(
                "attribute_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// A prompt body plus the persona it should run under, before formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub prompt_text: String,
    pub system_role: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserInputMode {
    #[serde(rename = "all_images")]
    AllImages,
    #[serde(rename = "None")]
    None,
}

/// One element of the `POST /generate-prompt` response array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPromptPair {
    #[serde(rename = "prompt")]
    pub prompt_text: String,
    pub system_role: String,
    #[serde(rename = "user_input")]
    pub user_input_mode: UserInputMode,
}

impl GeneratedPromptPair {
    /// Fans a formatted pair out to both input modes. Only the mode differs.
    pub fn for_all_modes(pair: PromptPair) -> [GeneratedPromptPair; 2] {
        [
            GeneratedPromptPair {
                prompt_text: pair.prompt_text.clone(),
                system_role: pair.system_role.clone(),
                user_input_mode: UserInputMode::AllImages,
            },
            GeneratedPromptPair {
                prompt_text: pair.prompt_text,
                system_role: pair.system_role,
                user_input_mode: UserInputMode::None,
            },
        ]
    }
}
