//! Error kinds raised by the compliance pipeline.
//!
//! Each stage has its own error type so callers can decide what is fatal:
//! only [`InputError`] aborts a whole evaluation. Gateway and store failures
//! degrade to "no evidence", and oracle or validation failures become a
//! per-framework "Analysis error" finding.

use thiserror::Error;

/// Invalid chunk size / overlap combination.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkingError {
    #[error("chunk size must be > 0")]
    ZeroSize,

    #[error("overlap ({overlap}) must be smaller than chunk size ({size})")]
    OverlapTooLarge { size: usize, overlap: usize },
}

/// Failure converting text into an embedding vector.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding provider is disabled")]
    Disabled,

    #[error("embedding request failed: {0}")]
    Request(String),

    #[error("embedding has {actual} dimensions, expected {expected}")]
    Dimension { expected: usize, actual: usize },

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
}

/// Failure reading from or writing to the chunk store.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("chunk store unavailable: {0}")]
    Connectivity(String),

    #[error("malformed vector for chunk {chunk_id}: {reason}")]
    MalformedVector { chunk_id: String, reason: String },

    #[error("{0}")]
    Other(String),
}

/// Failure calling the reasoning model.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("compliance oracle is disabled")]
    Disabled,

    #[error("oracle request failed: {0}")]
    Request(String),

    #[error("oracle returned no content")]
    EmptyResponse,
}

/// The oracle's output did not match the verdict schema.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("response is not valid JSON ({reason}): {excerpt}")]
    NotJson { reason: String, excerpt: String },

    #[error("response JSON is not an object: {excerpt}")]
    NotObject { excerpt: String },

    #[error("field `{field}` has the wrong shape: {reason}")]
    Field { field: &'static str, reason: String },

    #[error("unknown severity label `{0}`")]
    UnknownSeverity(String),
}

/// The evaluation request itself is unusable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("at least one of `ingredients` or `claims` must be non-empty")]
    EmptySubject,
}

/// Anything that can fail inside a single law framework's pipeline.
#[derive(Debug, Error)]
pub enum FrameworkError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Failure ingesting one chunk into the store.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Store(#[from] RetrievalError),
}
