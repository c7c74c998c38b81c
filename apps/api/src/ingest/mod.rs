//! Bulk ingestion of authored prompts into the similarity index.
//!
//! Runs once at startup, before the listener binds, and only when the index
//! is empty. It is the only writer of the index.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::index::{IndexError, SimilarityIndex};

pub mod merge;
pub mod sources;

use merge::{build_records, join_sources};
use sources::SourceTables;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Index write failed: {0}")]
    Index(#[from] IndexError),
}

/// Joins the exports, skips rows without a usable prompt, and upserts the
/// rest. Returns how many records were written. Re-running with the same
/// tables rewrites the same entries.
pub async fn ingest(
    index: &dyn SimilarityIndex,
    tables: &SourceTables,
) -> Result<usize, IngestError> {
    info!("Merging data...");
    let joined = join_sources(&tables.attributes, &tables.mappers, &tables.prompt_configs);
    let (records, skipped) = build_records(joined);

    for skip in &skipped {
        warn!(
            "Skipping attribute {} during ingestion: {}",
            skip.attribute_id, skip.reason
        );
    }
    info!(
        "Found {} attributes with prompts to index ({} skipped).",
        records.len(),
        skipped.len()
    );

    if !records.is_empty() {
        index.upsert(&records).await?;
    }
    info!("Indexing complete.");
    Ok(records.len())
}

/// Loads the CSV exports from `data_dir` if, and only if, the index is empty.
/// Missing exports are logged and leave the index untouched.
pub async fn initialize_index(
    index: &dyn SimilarityIndex,
    data_dir: &Path,
) -> Result<usize, IngestError> {
    let existing = index.count().await?;
    if existing > 0 {
        info!("Similarity index already contains {existing} items.");
        return Ok(0);
    }

    info!("Similarity index is empty. Loading data from CSVs...");
    let Some(files) = sources::discover(data_dir)? else {
        warn!(
            "CSV exports not found in {}. Skipping initial data load.",
            data_dir.display()
        );
        return Ok(0);
    };

    let tables = sources::load(&files)?;
    ingest(index, &tables).await
}
