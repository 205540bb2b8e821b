//! Chunk store abstraction.
//!
//! The [`ChunkStore`] trait is everything the retrieval pipeline needs from
//! a law corpus backend: write a chunk with its embedding, and run a
//! category-filtered similarity query. Backends: SQLite (app crate) and
//! [`memory::InMemoryStore`] for tests.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;

use crate::embedding::EmbeddingGateway;
use crate::error::{IngestError, RetrievalError};
use crate::models::{Chunk, RetrievalResult};

/// Default similarity floor; results must score strictly above it.
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Parameters for a single similarity query.
#[derive(Debug, Clone, Copy)]
pub struct VectorQuery<'a> {
    pub embedding: &'a [f32],
    /// Only match chunks with exactly this category.
    pub category: Option<&'a str>,
    /// Maximum number of rows returned.
    pub limit: usize,
    /// Exclusive similarity floor.
    pub threshold: f64,
}

/// Abstract law corpus backend.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert`](ChunkStore::insert) | Persist a chunk with its embedding |
/// | [`clear`](ChunkStore::clear) | Drop every chunk (full re-ingestion) |
/// | [`count`](ChunkStore::count) | Number of stored chunks |
/// | [`query`](ChunkStore::query) | Cosine similarity search |
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Persist a chunk and its embedding. No deduplication is performed.
    async fn insert(&self, chunk: &Chunk, embedding: &[f32]) -> Result<(), RetrievalError>;

    /// Remove all chunks.
    async fn clear(&self) -> Result<u64, RetrievalError>;

    /// Number of stored chunks.
    async fn count(&self) -> Result<u64, RetrievalError>;

    /// Results ordered by descending similarity, each strictly above
    /// `query.threshold`, at most `query.limit` of them.
    async fn query(&self, query: &VectorQuery<'_>) -> Result<Vec<RetrievalResult>, RetrievalError>;
}

/// Embed a chunk through the gateway and persist it.
pub async fn ingest<S: ChunkStore + ?Sized>(
    store: &S,
    gateway: &dyn EmbeddingGateway,
    chunk: &Chunk,
) -> Result<(), IngestError> {
    let embedding = gateway.embed(&chunk.text).await?;
    store.insert(chunk, &embedding).await?;
    Ok(())
}

/// Metadata recorded alongside every stored chunk.
pub fn chunk_metadata(chunk: &Chunk) -> serde_json::Value {
    serde_json::json!({
        "source": chunk.source_document,
        "category": chunk.category,
        "chunk_index": chunk.chunk_index,
    })
}

/// Apply threshold, ordering, and limit to scored rows.
///
/// Shared by every backend so they agree on tie handling: equal scores keep
/// their insertion order.
pub fn rank_results(mut scored: Vec<RetrievalResult>, query: &VectorQuery<'_>) -> Vec<RetrievalResult> {
    scored.retain(|r| r.similarity > query.threshold);
    scored.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(query.limit);
    scored
}
