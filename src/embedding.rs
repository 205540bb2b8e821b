//! Embedding gateway implementations.
//!
//! - **[`DisabledGateway`]** fails every call; used when embeddings are not
//!   configured.
//! - **[`OpenAIGateway`]** calls `POST {url}/v1/embeddings` with bounded
//!   retry (see [`crate::retry`]).
//!
//! # Provider Selection
//!
//! ```rust,no_run
//! # use label_lens::config::EmbeddingConfig;
//! # use label_lens::embedding::create_gateway;
//! let config = EmbeddingConfig::default(); // provider = "disabled"
//! let gateway = create_gateway(&config).unwrap();
//! assert_eq!(gateway.model_name(), "disabled");
//! ```

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use label_lens_core::embedding::EmbeddingGateway;
use label_lens_core::error::EmbeddingError;

use crate::config::EmbeddingConfig;
use crate::retry::post_json_with_retry;

/// A gateway that refuses to embed anything.
pub struct DisabledGateway;

#[async_trait]
impl EmbeddingGateway for DisabledGateway {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        0
    }
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Disabled)
    }
}

/// Embedding gateway backed by the OpenAI embeddings API.
pub struct OpenAIGateway {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dims: usize,
    api_key: String,
    max_retries: u32,
}

impl OpenAIGateway {
    /// Build the gateway. The API key is read from the environment here,
    /// once.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).with_context(|| {
            format!("{} environment variable not set", config.api_key_env)
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/v1/embeddings", config.url.trim_end_matches('/')),
            model: config.model.clone(),
            dims: config.dims,
            api_key,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl EmbeddingGateway for OpenAIGateway {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let body = serde_json::json!({
            "model": self.model,
            "input": [text],
        });
        let json = post_json_with_retry(
            &self.client,
            &self.endpoint,
            &self.api_key,
            &body,
            self.max_retries,
        )
        .await
        .map_err(|e| EmbeddingError::Request(format!("{:#}", e)))?;

        parse_embedding_response(&json, self.dims)
    }
}

/// Extract the first `data[].embedding` vector and check its length.
pub fn parse_embedding_response(
    json: &serde_json::Value,
    dims: usize,
) -> Result<Vec<f32>, EmbeddingError> {
    let embedding = json
        .get("data")
        .and_then(|d| d.as_array())
        .and_then(|d| d.first())
        .and_then(|item| item.get("embedding"))
        .and_then(|e| e.as_array())
        .ok_or_else(|| EmbeddingError::InvalidResponse("missing data[0].embedding".into()))?;

    let vector = embedding
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| EmbeddingError::InvalidResponse("non-numeric embedding value".into()))
        })
        .collect::<Result<Vec<f32>, _>>()?;

    if vector.len() != dims {
        return Err(EmbeddingError::Dimension {
            expected: dims,
            actual: vector.len(),
        });
    }
    Ok(vector)
}

/// Create the configured [`EmbeddingGateway`].
///
/// | Config Value | Gateway |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledGateway`] |
/// | `"openai"` | [`OpenAIGateway`] |
pub fn create_gateway(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingGateway>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledGateway)),
        "openai" => Ok(Box::new(OpenAIGateway::new(config)?)),
        other => bail!("Unknown embedding provider: {}", other),
    }
}
