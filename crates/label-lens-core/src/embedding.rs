//! Embedding gateway trait and vector utilities.
//!
//! Defines the [`EmbeddingGateway`] trait that all embedding backends
//! implement, plus pure helpers for vector serialization and similarity.
//!
//! Concrete gateways (OpenAI, disabled) live in the `label-lens` app crate.

use async_trait::async_trait;

use crate::error::{EmbeddingError, RetrievalError};

/// Converts text into a fixed-dimension vector.
#[async_trait]
pub trait EmbeddingGateway: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `1536`).
    fn dims(&self) -> usize;
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Encode a float vector as a BLOB (little-endian f32 bytes).
///
/// # Example
///
/// ```rust
/// use label_lens_core::embedding::{vec_to_blob, blob_to_vec};
///
/// let v = vec![1.0f32, -2.5, 3.125];
/// let blob = vec_to_blob(&v);
/// assert_eq!(blob.len(), 12);
/// assert_eq!(blob_to_vec(&blob).unwrap(), v);
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decode a BLOB back into a float vector.
///
/// Fails when the byte length is not a multiple of 4, which means the
/// stored vector was truncated or written by something else.
pub fn blob_to_vec(blob: &[u8]) -> Result<Vec<f32>, String> {
    if blob.len() % 4 != 0 {
        return Err(format!("blob length {} is not a multiple of 4", blob.len()));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Cosine similarity between two vectors, in `[-1.0, 1.0]`.
///
/// Returns `None` when the dimensions differ or either vector is empty;
/// a zero-magnitude vector yields `Some(0.0)`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f64::EPSILON {
        return Some(0.0);
    }
    Some((dot / denom).clamp(-1.0, 1.0))
}

/// Similarity of a stored vector to a query, as a store-level result.
pub fn score_stored_vector(
    chunk_id: &str,
    query: &[f32],
    stored: &[f32],
) -> Result<f64, RetrievalError> {
    cosine_similarity(query, stored).ok_or_else(|| RetrievalError::MalformedVector {
        chunk_id: chunk_id.to_string(),
        reason: format!(
            "stored vector has {} dimensions, query has {}",
            stored.len(),
            query.len()
        ),
    })
}
