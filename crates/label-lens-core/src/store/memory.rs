//! In-memory [`ChunkStore`] implementation for tests.
//!
//! Rows live in a `Vec` behind `std::sync::RwLock`. Queries are brute-force
//! cosine similarity over every row in the requested category.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::embedding::score_stored_vector;
use crate::error::RetrievalError;
use crate::models::{Chunk, RetrievalResult};

use super::{chunk_metadata, rank_results, ChunkStore, VectorQuery};

struct StoredChunk {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// In-memory chunk store.
#[derive(Default)]
pub struct InMemoryStore {
    rows: RwLock<Vec<StoredChunk>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> RetrievalError {
    RetrievalError::Connectivity("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl ChunkStore for InMemoryStore {
    async fn insert(&self, chunk: &Chunk, embedding: &[f32]) -> Result<(), RetrievalError> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        rows.push(StoredChunk {
            chunk: chunk.clone(),
            embedding: embedding.to_vec(),
        });
        Ok(())
    }

    async fn clear(&self) -> Result<u64, RetrievalError> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        let removed = rows.len() as u64;
        rows.clear();
        Ok(removed)
    }

    async fn count(&self) -> Result<u64, RetrievalError> {
        Ok(self.rows.read().map_err(|_| poisoned())?.len() as u64)
    }

    async fn query(&self, query: &VectorQuery<'_>) -> Result<Vec<RetrievalResult>, RetrievalError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        let mut scored = Vec::new();
        for row in rows.iter() {
            if let Some(category) = query.category {
                if row.chunk.category != category {
                    continue;
                }
            }
            let similarity = score_stored_vector(&row.chunk.id, query.embedding, &row.embedding)?;
            scored.push(RetrievalResult {
                chunk_text: row.chunk.text.clone(),
                metadata: chunk_metadata(&row.chunk),
                source_document: row.chunk.source_document.clone(),
                similarity,
            });
        }
        Ok(rank_results(scored, query))
    }
}
