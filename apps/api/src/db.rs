use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::index::{InMemoryIndex, PgTrigramIndex, SimilarityIndex};

/// Opens the similarity index: Postgres when a URL is configured, otherwise
/// an in-process index that starts empty on every boot.
pub async fn open_index(database_url: Option<&str>) -> Result<Arc<dyn SimilarityIndex>> {
    let Some(url) = database_url else {
        info!("DATABASE_URL not set, using in-memory similarity index");
        return Ok(Arc::new(InMemoryIndex::new()));
    };

    info!("Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await?;
    info!("PostgreSQL connection pool established");

    let index = PgTrigramIndex::new(pool);
    index.ensure_schema().await?;
    Ok(Arc::new(index))
}
