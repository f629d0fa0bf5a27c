//! Postgres-backed `SemanticCacheRepository` (spec §3 "ParsedResultRecord",
//! §4.5, §6 "Semantic-cache table").

use async_trait::async_trait;
use pgvector::Vector;
use sqlx::FromRow;
use souq_core::{Intent, ParsedResultRecord, Result};

use crate::postgres::client::PgStore;

#[derive(FromRow)]
struct ParsedResultRow {
    id: i64,
    query_text: String,
    query_embedding: Vector,
    parsed_result: serde_json::Value,
    hit_count: i32,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

fn row_to_record(row: ParsedResultRow) -> Result<ParsedResultRecord> {
    let parsed_result: Intent = serde_json::from_value(row.parsed_result)
        .map_err(|e| souq_core::Error::InternalInvariantViolation(format!("corrupt semantic cache row: {e}")))?;
    Ok(ParsedResultRecord {
        id: row.id,
        query_text: row.query_text,
        query_embedding: row.query_embedding.to_vec(),
        parsed_result,
        hit_count: row.hit_count,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub struct PgSemanticCacheRepository {
    store: PgStore,
    similarity_threshold: f32,
}

impl PgSemanticCacheRepository {
    pub fn new(store: PgStore, similarity_threshold: f32) -> Self {
        Self { store, similarity_threshold }
    }
}

#[async_trait]
impl souq_core::SemanticCacheRepository for PgSemanticCacheRepository {
    async fn find_nearest(&self, query_embedding: &[f32]) -> Result<Option<(ParsedResultRecord, f32)>> {
        let vector = Vector::from(query_embedding.to_vec());
        let row: Option<(ParsedResultRow, f32)> = sqlx::query_as(
            "SELECT id, query_text, query_embedding, parsed_result, hit_count, created_at, updated_at, \
             1 - (query_embedding <=> $1) AS similarity \
             FROM semantic_cache ORDER BY query_embedding <=> $1 LIMIT 1",
        )
        .bind(vector)
        .fetch_optional(self.store.pool())
        .await
        .map_err(crate::error::StoreError::from)?;

        match row {
            Some((row, similarity)) if similarity >= self.similarity_threshold => {
                Ok(Some((row_to_record(row)?, similarity)))
            }
            _ => Ok(None),
        }
    }

    async fn upsert(&self, query_text: &str, query_embedding: &[f32], intent_json: &str) -> Result<()> {
        let vector = Vector::from(query_embedding.to_vec());
        let parsed: serde_json::Value = serde_json::from_str(intent_json)
            .map_err(|e| souq_core::Error::InternalInvariantViolation(format!("invalid intent json: {e}")))?;

        sqlx::query(
            "INSERT INTO semantic_cache (query_text, query_embedding, parsed_result, hit_count, created_at, updated_at) \
             VALUES ($1, $2, $3, 1, now(), now()) \
             ON CONFLICT (query_text) DO UPDATE SET \
               parsed_result = EXCLUDED.parsed_result, hit_count = semantic_cache.hit_count + 1, updated_at = now()",
        )
        .bind(query_text)
        .bind(vector)
        .bind(parsed)
        .execute(self.store.pool())
        .await
        .map_err(crate::error::StoreError::from)?;
        Ok(())
    }

    async fn bump_hit_count(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE semantic_cache SET hit_count = hit_count + 1, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(self.store.pool())
            .await
            .map_err(crate::error::StoreError::from)?;
        Ok(())
    }

    async fn evict_stale(&self, max_age_days: i64) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM semantic_cache WHERE (hit_count < 2 AND created_at < now() - interval '7 days') \
             OR created_at < now() - ($1 || ' days')::interval",
        )
        .bind(max_age_days.to_string())
        .execute(self.store.pool())
        .await
        .map_err(crate::error::StoreError::from)?;
        Ok(result.rows_affected())
    }
}
