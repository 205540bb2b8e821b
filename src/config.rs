//! Configuration parsing and validation.
//!
//! Label Lens is configured with a single TOML file (default
//! `./config/lens.toml`). It is read once at startup, validated, and passed
//! by reference to every command.
//!
//! # Example
//!
//! ```toml
//! [db]
//! path = "./data/lens.sqlite"
//!
//! [chunking]
//! size_words = 300
//! overlap_words = 50
//!
//! [retrieval]
//! threshold = 0.3
//!
//! [embedding]
//! provider = "openai"
//!
//! [oracle]
//! provider = "openai"
//! model = "gpt-4.1"
//!
//! [[laws]]
//! name = "California Proposition 65"
//! category = "prop65"
//! ```

use anyhow::{Context, Result};
use label_lens_core::evaluate::DEFAULT_CONCURRENCY;
use label_lens_core::models::{default_frameworks, LawFramework};
use label_lens_core::oracle::OracleParams;
use label_lens_core::retrieve::RetrievalParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    /// Law frameworks evaluated by `lens check`, in report order.
    #[serde(default = "default_frameworks")]
    pub laws: Vec<LawFramework>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_size_words")]
    pub size_words: usize,
    #[serde(default = "default_overlap_words")]
    pub overlap_words: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size_words: default_size_words(),
            overlap_words: default_overlap_words(),
        }
    }
}

fn default_size_words() -> usize {
    label_lens_core::chunk::DEFAULT_CHUNK_SIZE
}
fn default_overlap_words() -> usize {
    label_lens_core::chunk::DEFAULT_OVERLAP
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Exclusive cosine similarity floor.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_per_query_limit")]
    pub per_query_limit: usize,
    #[serde(default = "default_max_queries")]
    pub max_queries: usize,
    #[serde(default = "default_evidence_cap")]
    pub evidence_cap: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            per_query_limit: default_per_query_limit(),
            max_queries: default_max_queries(),
            evidence_cap: default_evidence_cap(),
        }
    }
}

impl RetrievalConfig {
    pub fn params(&self) -> RetrievalParams {
        RetrievalParams {
            threshold: self.threshold,
            per_query_limit: self.per_query_limit,
            max_queries: self.max_queries,
            evidence_cap: self.evidence_cap,
        }
    }
}

fn default_threshold() -> f64 {
    label_lens_core::store::DEFAULT_THRESHOLD
}
fn default_per_query_limit() -> usize {
    5
}
fn default_max_queries() -> usize {
    4
}
fn default_evidence_cap() -> usize {
    8
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default = "default_openai_url")]
    pub url: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_embedding_model(),
            dims: default_dims(),
            url: default_openai_url(),
            api_key_env: default_api_key_env(),
            max_retries: default_max_retries(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OracleConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_oracle_model")]
    pub model: String,
    #[serde(default = "default_openai_url")]
    pub url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_oracle_timeout")]
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_oracle_model(),
            url: default_openai_url(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_retries: default_max_retries(),
            timeout_secs: default_oracle_timeout(),
        }
    }
}

impl OracleConfig {
    pub fn params(&self) -> OracleParams {
        OracleParams {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_oracle_model() -> String {
    "gpt-4.1".to_string()
}
fn default_dims() -> usize {
    1536
}
fn default_openai_url() -> String {
    "https://api.openai.com".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_max_retries() -> u32 {
    2
}
fn default_embedding_timeout() -> u64 {
    30
}
fn default_oracle_timeout() -> u64 {
    60
}
fn default_temperature() -> f32 {
    0.1
}
fn default_max_tokens() -> u32 {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct EvaluationConfig {
    /// Law frameworks evaluated at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Validate chunking
    if config.chunking.size_words == 0 {
        anyhow::bail!("chunking.size_words must be > 0");
    }
    if config.chunking.overlap_words >= config.chunking.size_words {
        anyhow::bail!("chunking.overlap_words must be smaller than chunking.size_words");
    }

    // Validate retrieval
    if !(-1.0..=1.0).contains(&config.retrieval.threshold) {
        anyhow::bail!("retrieval.threshold must be in [-1.0, 1.0]");
    }
    if config.retrieval.per_query_limit == 0 {
        anyhow::bail!("retrieval.per_query_limit must be >= 1");
    }
    if config.retrieval.max_queries == 0 {
        anyhow::bail!("retrieval.max_queries must be >= 1");
    }
    if config.retrieval.evidence_cap == 0 {
        anyhow::bail!("retrieval.evidence_cap must be >= 1");
    }

    // Validate providers
    match config.embedding.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled or openai.",
            other
        ),
    }
    if config.embedding.is_enabled() && config.embedding.dims == 0 {
        anyhow::bail!(
            "embedding.dims must be > 0 when provider is '{}'",
            config.embedding.provider
        );
    }
    match config.oracle.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown oracle provider: '{}'. Must be disabled or openai.",
            other
        ),
    }
    if !(0.0..=2.0).contains(&config.oracle.temperature) {
        anyhow::bail!("oracle.temperature must be in [0.0, 2.0]");
    }

    // Validate evaluation
    if config.evaluation.concurrency == 0 {
        anyhow::bail!("evaluation.concurrency must be >= 1");
    }
    if config.laws.is_empty() {
        anyhow::bail!("at least one [[laws]] entry is required");
    }
    for law in &config.laws {
        if law.name.trim().is_empty() || law.category.trim().is_empty() {
            anyhow::bail!("every [[laws]] entry needs a non-empty name and category");
        }
    }

    Ok(())
}
