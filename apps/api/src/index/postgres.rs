use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::index::{IndexError, SimilarityIndex};
use crate::models::attribute::{AttributeRecord, SimilarityResult};

const SCHEMA: &[&str] = &[
    "CREATE EXTENSION IF NOT EXISTS pg_trgm",
    r#"
    CREATE TABLE IF NOT EXISTS attribute_prompts (
        id             TEXT PRIMARY KEY,
        attribute_name TEXT NOT NULL,
        prompt         TEXT NOT NULL,
        system_role    TEXT NOT NULL DEFAULT '',
        original_id    TEXT NOT NULL DEFAULT ''
    )
    "#,
    "CREATE INDEX IF NOT EXISTS attribute_prompts_name_trgm \
     ON attribute_prompts USING gist (attribute_name gist_trgm_ops)",
];

#[derive(Debug, FromRow)]
struct NeighbourRow {
    attribute_name: String,
    prompt: String,
    system_role: String,
    distance: Option<f64>,
}

/// Durable index in Postgres. Distance is pg_trgm's `<->` over attribute names.
#[derive(Clone)]
pub struct PgTrigramIndex {
    pool: PgPool,
}

impl PgTrigramIndex {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the extension, table, and trigram index if they are missing.
    pub async fn ensure_schema(&self) -> Result<(), IndexError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("attribute_prompts schema ready");
        Ok(())
    }
}

#[async_trait]
impl SimilarityIndex for PgTrigramIndex {
    async fn upsert(&self, records: &[AttributeRecord]) -> Result<(), IndexError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query(
                r#"
                INSERT INTO attribute_prompts (id, attribute_name, prompt, system_role, original_id)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO UPDATE SET
                    attribute_name = EXCLUDED.attribute_name,
                    prompt         = EXCLUDED.prompt,
                    system_role    = EXCLUDED.system_role,
                    original_id    = EXCLUDED.original_id
                "#,
            )
            .bind(record.index_id())
            .bind(&record.attribute_name)
            .bind(&record.prompt_text)
            .bind(&record.system_role)
            .bind(&record.source_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        info!("Upserted {} documents into attribute_prompts", records.len());
        Ok(())
    }

    async fn query(&self, text: &str, k: usize) -> Result<Vec<SimilarityResult>, IndexError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let rows: Vec<NeighbourRow> = sqlx::query_as(
            r#"
            SELECT attribute_name, prompt, system_role,
                   (attribute_name <-> $1)::float8 AS distance
            FROM attribute_prompts
            ORDER BY distance ASC,
                     (lower(attribute_name) = lower($1)) DESC,
                     id ASC
            LIMIT $2
            "#,
        )
        .bind(text)
        .bind(k as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let distance = row.distance.ok_or_else(|| {
                    IndexError::Malformed(format!(
                        "missing distance for '{}'",
                        row.attribute_name
                    ))
                })?;
                Ok(SimilarityResult {
                    attribute_name: row.attribute_name,
                    prompt_text: row.prompt,
                    system_role: row.system_role,
                    distance,
                })
            })
            .collect()
    }

    async fn count(&self) -> Result<usize, IndexError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM attribute_prompts")
            .fetch_one(&self.pool)
            .await?;
        usize::try_from(count).map_err(|_| IndexError::Malformed(format!("negative count {count}")))
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::trigram;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    fn record(name: &str, prompt: &str) -> AttributeRecord {
        AttributeRecord {
            attribute_name: name.to_string(),
            prompt_text: prompt.to_string(),
            system_role: "expert".to_string(),
            source_id: "1".to_string(),
        }
    }

    /// Needs a Postgres with pg_trgm available:
    /// `DATABASE_URL=postgres://... cargo test -- --ignored`
    #[tokio::test]
    #[ignore]
    async fn test_trigram_index_against_postgres() {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            return;
        };
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .unwrap();
        let index = PgTrigramIndex::new(pool.clone());
        index.ensure_schema().await.unwrap();

        // A unique token keeps these rows apart from anything already stored.
        let token = format!("t{}", Uuid::new_v4().simple());
        let exact = format!("{token} heart_notes");
        let before = index.count().await.unwrap();

        index
            .upsert(&[
                record(&format!("{token} Heart-Notes"), "variant"),
                record(&exact, "first"),
                record(&format!("{token} base_notes"), "base"),
            ])
            .await
            .unwrap();
        // Same id: the conflict path rewrites the row instead of adding one.
        index.upsert(&[record(&exact, "Identify...")]).await.unwrap();
        assert_eq!(index.count().await.unwrap(), before + 3);

        let hits = index.query(&exact, 3).await.unwrap();
        assert_eq!(hits[0].attribute_name, exact);
        assert_eq!(hits[0].prompt_text, "Identify...");
        assert_eq!(hits[1].attribute_name, format!("{token} Heart-Notes"));
        for hit in &hits {
            let local = trigram::distance(&exact, &hit.attribute_name);
            assert!(
                (hit.distance - local).abs() < 1e-4,
                "{}: postgres {} vs local {local}",
                hit.attribute_name,
                hit.distance
            );
        }

        sqlx::query("DELETE FROM attribute_prompts WHERE attribute_name LIKE $1")
            .bind(format!("{token}%"))
            .execute(&pool)
            .await
            .unwrap();
    }
}
