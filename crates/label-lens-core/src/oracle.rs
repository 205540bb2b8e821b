//! Compliance oracle trait.
//!
//! The oracle is a reasoning-model call: it receives an assembled prompt and
//! returns free-form text that is expected to contain a single JSON verdict.
//! Concrete clients live in the `label-lens` app crate.

use async_trait::async_trait;

use crate::error::OracleError;

/// Sampling parameters for an oracle call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OracleParams {
    /// Low values keep the judgment near-deterministic.
    pub temperature: f32,
    /// Generation length cap.
    pub max_tokens: u32,
}

impl Default for OracleParams {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 1000,
        }
    }
}

#[async_trait]
pub trait ComplianceOracle: Send + Sync {
    /// Returns the model identifier.
    fn model_name(&self) -> &str;

    /// Run the prompt and return the raw completion text.
    async fn complete(&self, prompt: &str, params: &OracleParams) -> Result<String, OracleError>;
}
