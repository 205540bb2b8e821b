//! SQLite-backed [`ChunkStore`] implementation.
//!
//! Chunks live in the `law_chunks` table with their embedding stored as a
//! little-endian `f32` BLOB. Queries load every row in the requested
//! category and rank them by brute-force cosine similarity.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::{db, migrate};

use label_lens_core::embedding::{blob_to_vec, score_stored_vector, vec_to_blob};
use label_lens_core::error::RetrievalError;
use label_lens_core::models::{Chunk, RetrievalResult};
use label_lens_core::store::{chunk_metadata, rank_results, ChunkStore, VectorQuery};

/// SQLite implementation of the [`ChunkStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the configured database, creating the schema if needed.
    pub async fn open(config: &Config) -> anyhow::Result<Self> {
        let pool = db::connect(config).await?;
        migrate::apply(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Chunk counts per category, for ingest summaries.
    pub async fn category_counts(&self) -> Result<Vec<(String, i64)>, RetrievalError> {
        let rows = sqlx::query(
            "SELECT category, COUNT(*) AS n FROM law_chunks GROUP BY category ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows
            .iter()
            .map(|r| (r.get::<String, _>("category"), r.get::<i64, _>("n")))
            .collect())
    }
}

fn db_err(e: sqlx::Error) -> RetrievalError {
    RetrievalError::Connectivity(e.to_string())
}

#[async_trait]
impl ChunkStore for SqliteStore {
    async fn insert(&self, chunk: &Chunk, embedding: &[f32]) -> Result<(), RetrievalError> {
        let metadata = chunk_metadata(chunk);
        sqlx::query(
            r#"
            INSERT INTO law_chunks (id, text, embedding, dims, category, source_document,
                                    chunk_index, hash, metadata_json, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&chunk.id)
        .bind(&chunk.text)
        .bind(vec_to_blob(embedding))
        .bind(embedding.len() as i64)
        .bind(&chunk.category)
        .bind(&chunk.source_document)
        .bind(chunk.chunk_index)
        .bind(&chunk.hash)
        .bind(metadata.to_string())
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn clear(&self) -> Result<u64, RetrievalError> {
        let done = sqlx::query("DELETE FROM law_chunks")
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(done.rows_affected())
    }

    async fn count(&self) -> Result<u64, RetrievalError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM law_chunks")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(n as u64)
    }

    async fn query(&self, query: &VectorQuery<'_>) -> Result<Vec<RetrievalResult>, RetrievalError> {
        let rows = match query.category {
            Some(category) => {
                sqlx::query(
                    "SELECT id, text, embedding, category, source_document, chunk_index, metadata_json \
                     FROM law_chunks WHERE category = ?",
                )
                .bind(category)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT id, text, embedding, category, source_document, chunk_index, metadata_json \
                     FROM law_chunks",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(db_err)?;

        let mut scored = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.get("id");
            let blob: Vec<u8> = row.get("embedding");
            let stored = blob_to_vec(&blob).map_err(|reason| RetrievalError::MalformedVector {
                chunk_id: id.clone(),
                reason,
            })?;
            let similarity = score_stored_vector(&id, query.embedding, &stored)?;

            let chunk = Chunk {
                id,
                text: row.get("text"),
                category: row.get("category"),
                source_document: row.get("source_document"),
                chunk_index: row.get("chunk_index"),
                hash: String::new(),
            };
            let metadata_json: String = row.get("metadata_json");
            let metadata: serde_json::Value =
                serde_json::from_str(&metadata_json).unwrap_or_else(|_| chunk_metadata(&chunk));

            scored.push(RetrievalResult {
                chunk_text: chunk.text,
                metadata,
                source_document: chunk.source_document,
                similarity,
            });
        }

        Ok(rank_results(scored, query))
    }
}
