//! # Label Lens Core
//!
//! Runtime-agnostic logic for Label Lens: word-window chunking, the chunk
//! store abstraction, evidence retrieval, prompt construction, verdict
//! validation, hallucination filtering, severity normalization, and the
//! per-law aggregation loop.
//!
//! This crate contains no tokio, sqlx, or HTTP dependencies. External
//! collaborators (embedding gateway, chunk store backend, reasoning model)
//! are reached through the traits in [`embedding`], [`store`], and
//! [`oracle`]; the `label-lens` app crate supplies the concrete backends.
//!
//! ## Evaluation flow
//!
//! ```text
//! Subject ──▶ retrieve ──▶ prompt ──▶ oracle ──▶ validate ──▶ filter ──▶ normalize
//!                                                                        │
//!                                         AggregateReport ◀── evaluate ◀─┘
//! ```

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod evaluate;
pub mod filter;
pub mod models;
pub mod normalize;
pub mod oracle;
pub mod prompt;
pub mod retrieve;
pub mod store;
pub mod validate;

pub use error::{
    ChunkingError, EmbeddingError, FrameworkError, IngestError, InputError, OracleError,
    RetrievalError,
    ValidationError,
};
pub use evaluate::{Evaluation, Evaluator};
pub use models::{
    AggregateReport, Chunk, ComplianceFinding, Finding, LawFramework, LawResult, ReportEntry,
    RetrievalResult, Severity, Subject,
};
