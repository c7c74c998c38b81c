use serde::{Deserialize, Serialize};

/// A stored extraction prompt for one attribute, as written by ingestion.
///
/// `attribute_name` is kept case-preserving; the index key derived from it
/// is lowercased so re-ingesting the same name overwrites the same entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRecord {
    pub attribute_name: String,
    pub prompt_text: String,
    pub system_role: String,
    /// Attribute id from the source export.
    pub source_id: String,
}

impl AttributeRecord {
    /// `attr_` + lowercased name with every whitespace char replaced by `_`.
    pub fn index_id(&self) -> String {
        index_id_for(&self.attribute_name)
    }
}

pub fn index_id_for(attribute_name: &str) -> String {
    let normalized: String = attribute_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("attr_{normalized}")
}

/// One nearest-neighbour hit. `distance` is 0.0 for an identical name.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityResult {
    pub attribute_name: String,
    pub prompt_text: String,
    pub system_role: String,
    pub distance: f64,
}

impl SimilarityResult {
    pub fn matches_name(&self, attribute_name: &str) -> bool {
        self.attribute_name.to_lowercase() == attribute_name.to_lowercase()
    }
}

/// A neighbouring prompt handed to the synthesizer as in-context guidance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FewShotExample {
    pub attribute_name: String,
    pub prompt_text: String,
    pub system_role: String,
    pub distance: f64,
}

impl From<SimilarityResult> for FewShotExample {
    fn from(result: SimilarityResult) -> Self {
        Self {
            attribute_name: result.attribute_name,
            prompt_text: result.prompt_text,
            system_role: result.system_role,
            distance: result.distance,
        }
    }
}
