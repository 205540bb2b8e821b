//! Compliance oracle implementations.
//!
//! [`OpenAIOracle`] sends the assembled prompt as a single user message to
//! `POST {url}/v1/chat/completions` and returns the first choice's content.
//! [`DisabledOracle`] fails every call, so `lens check` still produces a
//! report (every framework with evidence becomes an "Analysis error").

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use label_lens_core::error::OracleError;
use label_lens_core::oracle::{ComplianceOracle, OracleParams};

use crate::config::OracleConfig;
use crate::retry::post_json_with_retry;

pub struct DisabledOracle;

#[async_trait]
impl ComplianceOracle for DisabledOracle {
    fn model_name(&self) -> &str {
        "disabled"
    }
    async fn complete(&self, _prompt: &str, _params: &OracleParams) -> Result<String, OracleError> {
        Err(OracleError::Disabled)
    }
}

/// Chat-completions client for an OpenAI-compatible API.
pub struct OpenAIOracle {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_retries: u32,
}

impl OpenAIOracle {
    pub fn new(config: &OracleConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).with_context(|| {
            format!("{} environment variable not set", config.api_key_env)
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/v1/chat/completions", config.url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl ComplianceOracle for OpenAIOracle {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, params: &OracleParams) -> Result<String, OracleError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
        });
        let json = post_json_with_retry(
            &self.client,
            &self.endpoint,
            &self.api_key,
            &body,
            self.max_retries,
        )
        .await
        .map_err(|e| OracleError::Request(format!("{:#}", e)))?;

        completion_text(&json)
    }
}

/// Pull `choices[0].message.content` out of a chat-completions response.
pub fn completion_text(json: &serde_json::Value) -> Result<String, OracleError> {
    let content = json
        .pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(str::trim)
        .unwrap_or_default();
    if content.is_empty() {
        return Err(OracleError::EmptyResponse);
    }
    Ok(content.to_string())
}

pub fn create_oracle(config: &OracleConfig) -> Result<Box<dyn ComplianceOracle>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledOracle)),
        "openai" => Ok(Box::new(OpenAIOracle::new(config)?)),
        other => bail!("Unknown oracle provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_text() {
        let json = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": " {\"issues\": []} "}}]
        });
        assert_eq!(completion_text(&json).unwrap(), "{\"issues\": []}");
    }

    #[test]
    fn test_empty_completion_is_an_error() {
        let json = serde_json::json!({"choices": [{"message": {"content": ""}}]});
        assert!(matches!(completion_text(&json), Err(OracleError::EmptyResponse)));
        assert!(matches!(
            completion_text(&serde_json::json!({"choices": []})),
            Err(OracleError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn test_disabled_oracle_fails() {
        let oracle = create_oracle(&OracleConfig::default()).unwrap();
        let err = oracle.complete("prompt", &OracleParams::default()).await.unwrap_err();
        assert!(matches!(err, OracleError::Disabled));
    }
}
