//! Trigram similarity with pg_trgm semantics, so the in-process index ranks
//! names the same way the Postgres backend does.
//!
//! A string is lowercased and split into runs of alphanumeric characters.
//! Each run is padded with two spaces in front and one behind, and every
//! three-character window becomes a trigram. Similarity is the Jaccard ratio
//! of the two trigram sets.

use std::collections::BTreeSet;

pub fn trigrams(text: &str) -> BTreeSet<String> {
    let lowered = text.to_lowercase();
    let mut set = BTreeSet::new();

    for word in lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let padded: Vec<char> = "  "
            .chars()
            .chain(word.chars())
            .chain(std::iter::once(' '))
            .collect();
        for window in padded.windows(3) {
            set.insert(window.iter().collect());
        }
    }

    set
}

/// 0.0 (nothing shared) to 1.0 (same trigram set).
pub fn similarity(a: &str, b: &str) -> f64 {
    let left = trigrams(a);
    let right = trigrams(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let shared = left.intersection(&right).count();
    let union = left.len() + right.len() - shared;
    shared as f64 / union as f64
}

/// The `<->` distance: `1 - similarity`.
pub fn distance(a: &str, b: &str) -> f64 {
    1.0 - similarity(a, b)
}
