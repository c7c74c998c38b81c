//! Similarity index: the nearest-neighbour store of previously authored prompts.
//!
//! Two backends sit behind `SimilarityIndex`:
//! - `PgTrigramIndex`: durable, Postgres + pg_trgm.
//! - `InMemoryIndex`: process-local, same trigram distance. Used when no
//!   database is configured and in tests.
//!
//! `AppState` carries an `Arc<dyn SimilarityIndex>`; the decision engine only
//! reads from it, ingestion is the only writer.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::attribute::{AttributeRecord, SimilarityResult};

pub mod memory;
pub mod postgres;
pub mod trigram;

pub use memory::InMemoryIndex;
pub use postgres::PgTrigramIndex;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Index returned an unusable response: {0}")]
    Malformed(String),

    #[error("Index unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    /// Inserts or overwrites entries keyed by `AttributeRecord::index_id`.
    /// Within one call a later record with the same key wins.
    async fn upsert(&self, records: &[AttributeRecord]) -> Result<(), IndexError>;

    /// Up to `k` stored entries closest to `text`, nearest first.
    /// An empty index yields an empty vector.
    async fn query(&self, text: &str, k: usize) -> Result<Vec<SimilarityResult>, IndexError>;

    async fn count(&self) -> Result<usize, IndexError>;

    /// Short label reported by `/health`.
    fn backend_name(&self) -> &'static str;
}
