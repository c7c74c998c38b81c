use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::index::trigram;
use crate::index::{IndexError, SimilarityIndex};
use crate::models::attribute::{AttributeRecord, SimilarityResult};

/// Process-local index. Entries live in a map keyed by index id, so iteration
/// order (and therefore the last tie-break between equal distances) is by id.
#[derive(Default)]
pub struct InMemoryIndex {
    entries: RwLock<BTreeMap<String, AttributeRecord>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> IndexError {
        IndexError::Unavailable("in-memory index lock poisoned".to_string())
    }
}

#[async_trait]
impl SimilarityIndex for InMemoryIndex {
    async fn upsert(&self, records: &[AttributeRecord]) -> Result<(), IndexError> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        for record in records {
            entries.insert(record.index_id(), record.clone());
        }
        Ok(())
    }

    async fn query(&self, text: &str, k: usize) -> Result<Vec<SimilarityResult>, IndexError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        let mut scored: Vec<SimilarityResult> = entries
            .values()
            .map(|record| SimilarityResult {
                attribute_name: record.attribute_name.clone(),
                prompt_text: record.prompt_text.clone(),
                system_role: record.system_role.clone(),
                distance: trigram::distance(text, &record.attribute_name),
            })
            .collect();

        // Among equal distances the case-insensitive name match ranks first;
        // the stable sort keeps id order for the rest.
        scored.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| b.matches_name(text).cmp(&a.matches_name(text)))
        });
        scored.truncate(k);
        Ok(scored)
    }

    async fn count(&self) -> Result<usize, IndexError> {
        Ok(self.entries.read().map_err(|_| Self::poisoned())?.len())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
